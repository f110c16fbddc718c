pub mod model;
pub mod parser;

use anyhow::{Context, Result};
use chrono::Locale;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::render::engine::{PlacedWidget, Position, Scene};
use crate::render::text::FontSpec;
use crate::widgets::calendar::CalendarWidget;
use crate::widgets::clock::{ClockWidget, DayNight};
use crate::widgets::geometry::ColorTriple;
use crate::widgets::info::{InfoSources, InfoWidget};
use crate::widgets::time_format::{locale_from_env, resolve_locale};
use crate::widgets::AnyWidget;
use model::{CalendarEntry, ClockEntry, InfoEntry, Wallpaper, WidgetEntry};

/// Top-level player configuration
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub config_path: PathBuf,
    /// Override the wallpaper size from the widget file
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub interval: Duration,
    pub font: Option<PathBuf>,
    pub bold_font: Option<PathBuf>,
    pub output_mode: OutputMode,
    pub output_path: PathBuf,
    /// Render a single frame and exit
    pub once: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Save each frame as PNG
    #[default]
    Png,
    /// Output raw RGBA pixels to stdout (for piping)
    Raw,
}

impl std::str::FromStr for OutputMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(OutputMode::Png),
            "raw" | "stdout" => Ok(OutputMode::Raw),
            _ => Err(format!("Unknown output mode: {s}")),
        }
    }
}

/// Read the widget file and resolve it into a drawable scene.
pub fn load_scene(config: &PlayerConfig) -> Result<Scene> {
    let wallpaper = parser::parse_widget_file(&config.config_path)?;
    let mut scene = build_scene(wallpaper)
        .with_context(|| format!("Invalid widget file: {}", config.config_path.display()))?;
    if let Some(width) = config.width {
        scene.width = width;
    }
    if let Some(height) = config.height {
        scene.height = height;
    }
    info!(
        "Scene {}x{} with {} widget(s) from {}",
        scene.width,
        scene.height,
        scene.widgets.len(),
        config.config_path.display()
    );
    Ok(scene)
}

pub fn build_scene(wallpaper: Wallpaper) -> Result<Scene> {
    let locale = match &wallpaper.locale {
        Some(name) => resolve_locale(name),
        None => locale_from_env(),
    };
    let background = ColorTriple::parse(&wallpaper.background).context("Invalid background color")?;

    let widgets = wallpaper
        .widgets
        .items
        .iter()
        .map(|entry| build_widget(entry, locale))
        .collect::<Result<Vec<_>>>()?;

    Ok(Scene {
        width: wallpaper.width,
        height: wallpaper.height,
        background,
        margin: wallpaper.margin,
        widgets,
    })
}

fn common(position: &str, color: &str, font: &str) -> Result<(Option<Position>, ColorTriple, FontSpec)> {
    Ok((
        Position::parse(position)?,
        ColorTriple::parse(color)?,
        FontSpec::parse(font)?,
    ))
}

fn build_widget(entry: &WidgetEntry, locale: Locale) -> Result<PlacedWidget> {
    match entry {
        WidgetEntry::Calendar(cal) => build_calendar(cal, locale).context("calendar"),
        WidgetEntry::Clock(clock) => build_clock(clock, locale).context("clock"),
        WidgetEntry::Info(info) => build_info(info).context("info"),
    }
}

fn build_calendar(entry: &CalendarEntry, locale: Locale) -> Result<PlacedWidget> {
    let (position, color, font) = common(&entry.position, &entry.color, &entry.font)?;
    let mut calendar = CalendarWidget::new(font, color, locale);
    calendar.header_align = entry.header_align.clamp(0.0, 1.0);
    calendar.day_align = entry.day_align.clamp(0.0, 1.0);
    Ok(PlacedWidget {
        position,
        widget: AnyWidget::Calendar(calendar),
    })
}

fn build_clock(entry: &ClockEntry, locale: Locale) -> Result<PlacedWidget> {
    let (position, color, font) = common(&entry.position, &entry.color, &entry.font)?;
    let mut colors = DayNight::default();
    if let Some(night) = &entry.night {
        colors.night = ColorTriple::parse(night)?;
    }
    if let Some(noon) = &entry.noon {
        colors.noon = ColorTriple::parse(noon)?;
    }

    let mut clock = ClockWidget::new(font, color, locale);
    clock.radius = entry.radius;
    clock.format = entry.format.clone();
    clock.analog = entry.analog;
    clock.digital = entry.digital;
    clock.hour_ring = entry.hour_ring;
    clock.minute_ring = entry.minute_ring;
    clock.colors = colors;
    clock.validate()?;
    Ok(PlacedWidget {
        position,
        widget: AnyWidget::Clock(clock),
    })
}

fn build_info(entry: &InfoEntry) -> Result<PlacedWidget> {
    let (position, color, font) = common(&entry.position, &entry.color, &entry.font)?;
    let mut sources = InfoSources {
        network: entry.network.clone(),
        quote_command: entry.quote_command.clone().filter(|c| !c.trim().is_empty()),
        ..InfoSources::default()
    };
    if let Some(path) = &entry.cpuinfo {
        sources.cpuinfo = Path::new(path).to_path_buf();
    }
    if let Some(path) = &entry.meminfo {
        sources.meminfo = Path::new(path).to_path_buf();
    }
    Ok(PlacedWidget {
        position,
        widget: AnyWidget::Info(InfoWidget::new(font, color, sources)),
    })
}
