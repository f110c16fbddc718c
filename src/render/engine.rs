/// Rendering engine: stacks the configured widgets onto a framebuffer using tiny-skia.
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use std::path::Path;
use tiny_skia::{Color, Pixmap};
use tracing::debug;

use crate::render::surface::{PixmapSurface, Surface};
use crate::render::text::FontBook;
use crate::widgets::geometry::ColorTriple;
use crate::widgets::{AnyWidget, Widget};

/// Vertical anchor of a widget on the wallpaper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Top,
    Middle,
    Bottom,
}

impl Position {
    /// `None` for an empty or "none" position, which hides the widget
    pub fn parse(s: &str) -> Result<Option<Self>> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(None),
            "top" => Ok(Some(Position::Top)),
            "middle" | "center" => Ok(Some(Position::Middle)),
            "bottom" => Ok(Some(Position::Bottom)),
            other => anyhow::bail!("Unknown widget position: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlacedWidget {
    pub position: Option<Position>,
    pub widget: AnyWidget,
}

/// Everything needed to draw a frame
#[derive(Debug, Clone)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub background: ColorTriple,
    pub margin: f64,
    pub widgets: Vec<PlacedWidget>,
}

/// Top edge of every widget, `None` for hidden ones.
/// Widgets sharing a position are stacked in order with `margin` between them.
pub fn stack_offsets(slots: &[(Option<Position>, f64)], frame_height: f64, margin: f64) -> Vec<Option<f64>> {
    let block = |pos: Position| {
        let heights: Vec<f64> = slots
            .iter()
            .filter(|(p, _)| *p == Some(pos))
            .map(|(_, h)| *h)
            .collect();
        let gaps = heights.len().saturating_sub(1) as f64 * margin;
        heights.iter().sum::<f64>() + gaps
    };

    let mut top = margin;
    let mut middle = (frame_height - block(Position::Middle)) / 2.0;
    let mut bottom = frame_height - margin - block(Position::Bottom);

    slots
        .iter()
        .map(|(pos, h)| {
            let cursor = match pos {
                Some(Position::Top) => &mut top,
                Some(Position::Middle) => &mut middle,
                Some(Position::Bottom) => &mut bottom,
                None => return None,
            };
            let y = *cursor;
            *cursor += h + margin;
            Some(y)
        })
        .collect()
}

pub struct RenderEngine {
    framebuffer: Pixmap,
    fonts: FontBook,
    background: Color,
    margin: f64,
    widgets: Vec<PlacedWidget>,
    frame: u64,
}

impl RenderEngine {
    pub fn new(scene: Scene, fonts: FontBook) -> Result<Self> {
        let framebuffer = Pixmap::new(scene.width, scene.height)
            .with_context(|| format!("Invalid framebuffer size {}x{}", scene.width, scene.height))?;
        let [r, g, b] = scene.background.0;
        let background = Color::from_rgba(r as f32, g as f32, b as f32, 1.0)
            .context("Background color out of range")?;

        for placed in &scene.widgets {
            placed
                .widget
                .validate()
                .with_context(|| format!("Invalid {} widget", placed.widget.name()))?;
        }

        Ok(Self {
            framebuffer,
            fonts,
            background,
            margin: scene.margin,
            widgets: scene.widgets,
            frame: 0,
        })
    }

    /// Re-read external facts for the next frame.
    pub async fn refresh(&mut self) {
        for placed in self.widgets.iter_mut().filter(|p| p.position.is_some()) {
            placed.widget.refresh().await;
        }
    }

    /// Render a complete frame for the given instant.
    pub fn render_frame(&mut self, now: &DateTime<FixedOffset>) -> Result<&[u8]> {
        self.framebuffer.fill(self.background);
        let frame_height = self.framebuffer.height() as f64;

        let mut surface = PixmapSurface::new(&mut self.framebuffer, &self.fonts);
        let mut slots = Vec::with_capacity(self.widgets.len());
        for placed in &self.widgets {
            let height = match placed.position {
                Some(_) => placed
                    .widget
                    .height(&surface, now)
                    .with_context(|| format!("Failed to measure {} widget", placed.widget.name()))?,
                None => 0.0,
            };
            slots.push((placed.position, height));
        }

        let offsets = stack_offsets(&slots, frame_height, self.margin);
        for (placed, offset) in self.widgets.iter().zip(offsets) {
            let Some(y) = offset else {
                continue;
            };
            // a text widget leaves its anchor as the current point
            surface.new_path();
            surface.save();
            surface.translate(self.margin, y);
            let drawn = placed.widget.draw(&mut surface, now);
            surface.restore();
            drawn.with_context(|| format!("Failed to draw {} widget", placed.widget.name()))?;
            debug!("Frame {}: {} at y={}", self.frame, placed.widget.name(), y);
        }

        self.frame += 1;
        Ok(self.framebuffer.data())
    }

    pub fn pixels(&self) -> &[u8] {
        self.framebuffer.data()
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.framebuffer
            .save_png(path)
            .map_err(|e| anyhow::anyhow!("Failed to save PNG: {}", e))
    }

    pub fn width(&self) -> u32 {
        self.framebuffer.width()
    }

    pub fn height(&self) -> u32 {
        self.framebuffer.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::text::FontSpec;
    use crate::widgets::calendar::CalendarWidget;
    use crate::widgets::clock::ClockWidget;
    use chrono::{Locale, TimeZone};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 10, 7, 0)
            .unwrap()
    }

    fn clock(radius: f64) -> AnyWidget {
        let mut clock = ClockWidget::new(FontSpec::default(), ColorTriple([1.0, 1.0, 1.0]), Locale::POSIX);
        clock.radius = radius;
        AnyWidget::Clock(clock)
    }

    fn scene(widgets: Vec<PlacedWidget>) -> Scene {
        Scene {
            width: 100,
            height: 100,
            background: ColorTriple([0.0, 0.0, 0.0]),
            margin: 5.0,
            widgets,
        }
    }

    fn lit(engine: &RenderEngine, y: std::ops::Range<u32>) -> bool {
        let width = engine.width() as usize;
        y.into_iter().any(|row| {
            let start = row as usize * width * 4;
            engine.pixels()[start..start + width * 4]
                .chunks_exact(4)
                .any(|px| px[0] > 0)
        })
    }

    #[test]
    fn test_position_parse() {
        assert_eq!(Position::parse("top").unwrap(), Some(Position::Top));
        assert_eq!(Position::parse(" Bottom ").unwrap(), Some(Position::Bottom));
        assert_eq!(Position::parse("center").unwrap(), Some(Position::Middle));
        assert_eq!(Position::parse("").unwrap(), None);
        assert_eq!(Position::parse("none").unwrap(), None);
        assert!(Position::parse("left").is_err());
    }

    #[test]
    fn test_stack_offsets() {
        let slots = [
            (Some(Position::Top), 10.0),
            (Some(Position::Bottom), 20.0),
            (None, 50.0),
            (Some(Position::Top), 30.0),
            (Some(Position::Middle), 40.0),
            (Some(Position::Bottom), 10.0),
        ];
        let offsets = stack_offsets(&slots, 200.0, 5.0);
        assert_eq!(
            offsets,
            vec![Some(5.0), Some(160.0), None, Some(20.0), Some(80.0), Some(185.0)]
        );
    }

    #[test]
    fn test_render_frame_draws_clock() {
        let placed = PlacedWidget {
            position: Some(Position::Top),
            widget: clock(20.0),
        };
        let mut engine = RenderEngine::new(scene(vec![placed]), FontBook::builtin().unwrap()).unwrap();
        let data = engine.render_frame(&now()).unwrap();
        assert_eq!(data.len(), 100 * 100 * 4);
        // dial occupies y = 5..45
        assert!(lit(&engine, 5..46));
        assert!(!lit(&engine, 50..100));
    }

    #[test]
    fn test_no_stray_path_between_widgets() {
        let calendar = CalendarWidget::new(
            FontSpec::parse("Sans 6").unwrap(),
            ColorTriple([1.0, 1.0, 1.0]),
            Locale::POSIX,
        );
        let mut ringed = ClockWidget::new(FontSpec::default(), ColorTriple([1.0, 1.0, 1.0]), Locale::POSIX);
        ringed.radius = 20.0;
        ringed.hour_ring = true;
        ringed.minute_ring = true;

        let mut frame = scene(vec![
            PlacedWidget {
                position: Some(Position::Top),
                widget: AnyWidget::Calendar(calendar),
            },
            PlacedWidget {
                position: Some(Position::Top),
                widget: AnyWidget::Clock(ringed),
            },
        ]);
        frame.width = 200;
        frame.height = 200;
        let mut engine = RenderEngine::new(frame, FontBook::builtin().unwrap()).unwrap();
        engine.render_frame(&now()).unwrap();

        let fonts = FontBook::builtin().unwrap();
        let mut scratch = Pixmap::new(1, 1).unwrap();
        let surface = PixmapSurface::new(&mut scratch, &fonts);
        let calendar_height = engine.widgets[0].widget.height(&surface, &now()).unwrap();
        let clock_top = 5.0 + calendar_height + 5.0;

        // right of the dial and below the calendar nothing is painted
        let width = engine.width() as usize;
        let stray: Vec<(usize, usize)> = (clock_top as usize..200)
            .flat_map(|y| (55..200).map(move |x| (x, y)))
            .filter(|&(x, y)| engine.pixels()[(y * width + x) * 4 + 3] > 0)
            .collect();
        assert!(stray.is_empty(), "stray pixels {:?}", &stray[..stray.len().min(5)]);
        assert!(lit(&engine, clock_top as u32..clock_top as u32 + 40));
    }

    #[test]
    fn test_hidden_widget_not_drawn() {
        let placed = PlacedWidget {
            position: None,
            widget: clock(20.0),
        };
        let mut engine = RenderEngine::new(scene(vec![placed]), FontBook::builtin().unwrap()).unwrap();
        engine.render_frame(&now()).unwrap();
        assert!(!lit(&engine, 0..100));
    }

    #[test]
    fn test_invalid_widget_rejected_up_front() {
        let placed = PlacedWidget {
            position: Some(Position::Top),
            widget: clock(-1.0),
        };
        let err = RenderEngine::new(scene(vec![placed]), FontBook::builtin().unwrap());
        assert!(err.is_err());
    }

    #[test]
    fn test_background_fill() {
        let mut background = scene(Vec::new());
        background.background = ColorTriple([1.0, 0.0, 0.0]);
        let mut engine = RenderEngine::new(background, FontBook::builtin().unwrap()).unwrap();
        let data = engine.render_frame(&now()).unwrap();
        assert_eq!(&data[..4], &[255, 0, 0, 255]);
    }
}
