pub mod calendar;
pub mod clock;
pub mod geometry;
pub mod info;
pub mod time_format;

use chrono::{DateTime, FixedOffset};

use crate::error::Result;
use crate::render::surface::Surface;

/// A wallpaper widget drawn once per refresh tick.
/// Drawing never touches the system; `now` is read once by the caller.
pub trait Widget {
    fn name(&self) -> &'static str;

    /// Vertical extent in pixels, used to stack widgets.
    fn height<S: Surface>(&self, surface: &S, now: &DateTime<FixedOffset>) -> Result<f64>;

    /// Draw with the widget's top-left at the surface origin.
    fn draw<S: Surface>(&self, surface: &mut S, now: &DateTime<FixedOffset>) -> Result<()>;
}

/// The widgets a wallpaper can hold.
#[derive(Debug, Clone)]
pub enum AnyWidget {
    Calendar(calendar::CalendarWidget),
    Clock(clock::ClockWidget),
    Info(info::InfoWidget),
}

impl AnyWidget {
    pub fn validate(&self) -> Result<()> {
        match self {
            AnyWidget::Clock(clock) => clock.validate(),
            AnyWidget::Calendar(_) | AnyWidget::Info(_) => Ok(()),
        }
    }

    /// Collect whatever the next frame shows from outside the process.
    pub async fn refresh(&mut self) {
        if let AnyWidget::Info(info) = self {
            info.refresh().await;
        }
    }
}

impl Widget for AnyWidget {
    fn name(&self) -> &'static str {
        match self {
            AnyWidget::Calendar(w) => w.name(),
            AnyWidget::Clock(w) => w.name(),
            AnyWidget::Info(w) => w.name(),
        }
    }

    fn height<S: Surface>(&self, surface: &S, now: &DateTime<FixedOffset>) -> Result<f64> {
        match self {
            AnyWidget::Calendar(w) => w.height(surface, now),
            AnyWidget::Clock(w) => w.height(surface, now),
            AnyWidget::Info(w) => w.height(surface, now),
        }
    }

    fn draw<S: Surface>(&self, surface: &mut S, now: &DateTime<FixedOffset>) -> Result<()> {
        match self {
            AnyWidget::Calendar(w) => w.draw(surface, now),
            AnyWidget::Clock(w) => w.draw(surface, now),
            AnyWidget::Info(w) => w.draw(surface, now),
        }
    }
}
