/// Month calendar: layout model and grid renderer.
use chrono::{DateTime, Datelike, Days, FixedOffset, Locale, NaiveDate};
use tracing::debug;

use crate::error::{Result, WidgetError};
use crate::render::surface::Surface;
use crate::render::text::{FontSpec, TextLayout};
use crate::widgets::geometry::ColorTriple;
use crate::widgets::time_format::format_date;
use crate::widgets::Widget;

/// One calendar row, Monday first. `0` marks a cell outside the month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekRow {
    /// ISO 8601 week of the first real day in the row
    pub iso_week: u32,
    pub days: [u32; 7],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<WeekRow>,
}

impl MonthGrid {
    pub fn build(year: i32, month: u32) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(WidgetError::InvalidMonth { year, month })?;

        let mut weeks = Vec::with_capacity(6);
        let mut row: Option<WeekRow> = None;
        let mut date = first;
        while date.month() == month {
            let col = date.weekday().num_days_from_monday() as usize;
            let current = row.get_or_insert_with(|| WeekRow {
                iso_week: date.iso_week().week(),
                days: [0; 7],
            });
            current.days[col] = date.day();
            if col == 6 {
                weeks.extend(row.take());
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        weeks.extend(row);

        Ok(Self { year, month, weeks })
    }

    pub fn day_count(&self) -> usize {
        self.weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .filter(|d| **d != 0)
            .count()
    }
}

/// Text grid with cell size derived from the font's "M".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub cell_width: f64,
    pub cell_height: f64,
}

impl Grid {
    pub fn measure<S: Surface>(surface: &S, font: &FontSpec) -> Self {
        let mut layout = surface.create_layout();
        layout.set_font(font);
        layout.set_text("M");
        let (w, h) = layout.pixel_size();
        Self {
            cell_width: 2.5 * w as f64,
            cell_height: h as f64,
        }
    }

    /// Place a layout in a cell; `halign` 0 = left, 0.5 = center, 1 = right.
    /// The text baseline sits on the bottom edge of the cell.
    pub fn put<S: Surface>(
        &self,
        surface: &mut S,
        layout: &S::Layout,
        col: u32,
        row: u32,
        halign: f64,
        col_span: u32,
    ) -> Result<()> {
        let x = col as f64 * self.cell_width;
        let y = row as f64 * self.cell_height;
        let (text_width, _) = layout.pixel_size();
        let span_width = col_span as f64 * self.cell_width;
        surface.move_to(
            x + (span_width - text_width as f64) * halign,
            y + (self.cell_height - layout.baseline() as f64),
        );
        surface.show_layout(layout)
    }
}

/// Rows used above the week rows: title and weekday names.
const HEADER_ROWS: u32 = 2;

#[derive(Debug, Clone)]
pub struct CalendarWidget {
    pub font: FontSpec,
    pub color: ColorTriple,
    pub header_align: f64,
    pub day_align: f64,
    pub locale: Locale,
}

impl CalendarWidget {
    pub fn new(font: FontSpec, color: ColorTriple, locale: Locale) -> Self {
        Self {
            font,
            color,
            header_align: 1.0,
            day_align: 1.0,
            locale,
        }
    }

    pub fn render<S: Surface>(&self, surface: &mut S, year: i32, month: u32, today: u32) -> Result<()> {
        let month_grid = MonthGrid::build(year, month)?;
        let grid = Grid::measure(surface, &self.font);
        debug!(
            "Calendar {}-{:02}: {} days in {} weeks",
            month_grid.year,
            month_grid.month,
            month_grid.day_count(),
            month_grid.weeks.len()
        );

        let mut layout = surface.create_layout();
        layout.set_font(&self.font);
        let mut small = surface.create_layout();
        small.set_font(&self.font.scaled(0.6));
        let mut bold = surface.create_layout();
        bold.set_font(&self.font.with_bold(true));

        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(WidgetError::InvalidMonth { year, month })?;
        layout.set_text(&format_date(first, "%B %Y", self.locale)?);
        grid.put(surface, &layout, 1, 0, 0.5, 7)?;

        // 2024-01-01 is a Monday
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        for wd in 0..7u32 {
            let day = monday
                .checked_add_days(Days::new(wd as u64))
                .unwrap_or(monday);
            let name = format_date(day, "%a", self.locale)?;
            layout.set_text(&name);
            // long abbreviations get cut to two letters to stay inside the cell
            if layout.pixel_size().0 as f64 > grid.cell_width {
                layout.set_text(&name.chars().take(2).collect::<String>());
            }
            grid.put(surface, &layout, wd + 1, 1, self.header_align, 1)?;
        }

        for (i, week) in month_grid.weeks.iter().enumerate() {
            let row = HEADER_ROWS + i as u32;
            small.set_text(&week.iso_week.to_string());
            grid.put(surface, &small, 0, row, self.day_align, 1)?;

            for (col, &day) in week.days.iter().enumerate() {
                if day == 0 {
                    continue;
                }
                let day_layout = if day == today { &mut bold } else { &mut layout };
                day_layout.set_text(&day.to_string());
                grid.put(surface, &*day_layout, col as u32 + 1, row, self.day_align, 1)?;
            }
        }
        Ok(())
    }
}

impl Widget for CalendarWidget {
    fn name(&self) -> &'static str {
        "calendar"
    }

    fn height<S: Surface>(&self, surface: &S, _now: &DateTime<FixedOffset>) -> Result<f64> {
        // title, weekdays, six weeks and a spare row
        Ok(9.0 * Grid::measure(surface, &self.font).cell_height)
    }

    fn draw<S: Surface>(&self, surface: &mut S, now: &DateTime<FixedOffset>) -> Result<()> {
        surface.set_source_rgb(self.color.red(), self.color.green(), self.color.blue());
        self.render(surface, now.year(), now.month(), now.day())
    }
}
