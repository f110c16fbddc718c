/// Clock widget: analog dial with optional day/night wedge rings, and digital text.
use chrono::{DateTime, FixedOffset, Locale, Timelike};

use crate::error::{Result, WidgetError};
use crate::render::surface::{LineCap, Surface};
use crate::render::text::{FontSpec, TextLayout};
use crate::widgets::geometry::{angle_to_unit_vector, clock_to_arc_angle, mix_color, ColorTriple};
use crate::widgets::time_format::{format_datetime, validate_format};
use crate::widgets::Widget;

const TICKS: u32 = 60;
const HOUR_HAND: f64 = 0.6;
const MINUTE_HAND: f64 = 0.85;
const DIGITAL_LINE_SPACING: f32 = 1.2;
/// Alpha of the digital text when drawn over the dial.
const DIGITAL_OVER_DIAL_ALPHA: f64 = 0.6;

/// Hour and minute read once per draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
    pub hour24: u32,
    pub minute: u32,
}

impl ClockReading {
    pub fn new(hour24: u32, minute: u32) -> Self {
        Self {
            hour24: hour24 % 24,
            minute: minute % 60,
        }
    }

    pub fn from_time<T: Timelike>(time: &T) -> Self {
        Self::new(time.hour(), time.minute())
    }

    /// Hour hand position on the 60 unit dial, moving smoothly with the minutes.
    pub fn hour_units(&self) -> f64 {
        (self.hour24 % 12) as f64 * 5.0 + self.minute as f64 / 12.0
    }

    /// Whole wedges of the hour ring on the 60 unit dial.
    pub fn hour_ring_units(&self) -> u32 {
        (self.hour24 % 12) * 5 + self.minute / 12
    }

    pub fn is_afternoon(&self) -> bool {
        self.hour24 >= 12
    }
}

/// Band of the dial a wedge ring occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ring {
    Inner,
    Outer,
}

impl Ring {
    /// (inner, outer) radius as a fraction of the dial radius
    pub fn radii(self) -> (f64, f64) {
        match self {
            Ring::Inner => (0.63, 0.73),
            Ring::Outer => (0.73, 0.85),
        }
    }
}

/// Reference colors of the wedge rings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayNight {
    pub night: ColorTriple,
    pub noon: ColorTriple,
}

impl Default for DayNight {
    fn default() -> Self {
        Self {
            night: ColorTriple::NIGHT,
            noon: ColorTriple::NOON,
        }
    }
}

impl DayNight {
    /// Before noon wedges run night to noon, after noon noon to night.
    pub fn wedge_color(&self, index: u32, full: u32, reading: &ClockReading) -> ColorTriple {
        let fraction = index as f64 / full as f64;
        if reading.is_afternoon() {
            mix_color(&self.noon, &self.night, fraction)
        } else {
            mix_color(&self.night, &self.noon, fraction)
        }
    }
}

fn check_radius(radius: f64) -> Result<()> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(WidgetError::InvalidRadius(radius));
    }
    Ok(())
}

fn draw_tick<S: Surface>(surface: &mut S, value: u32, emphasis: bool, radius: f64) -> Result<()> {
    let (xv, yv) = angle_to_unit_vector(value as f64, TICKS as f64);
    let inner = if emphasis {
        surface.set_line_width(2.0);
        radius * 0.9
    } else {
        surface.set_line_width(1.0);
        radius * 0.95
    };
    surface.move_to(inner * xv, inner * yv);
    surface.line_to(radius * xv, radius * yv);
    surface.stroke()
}

fn draw_hand<S: Surface>(surface: &mut S, value: f64, full: f64, length: f64, width: f64) -> Result<()> {
    let (xv, yv) = angle_to_unit_vector(value, full);
    surface.set_line_width(width);
    surface.move_to(0.0, 0.0);
    surface.line_to(length * xv, length * yv);
    surface.stroke()
}

/// Dial outline, 60 ticks and both hands, centered on (radius, radius).
pub fn render_analog<S: Surface>(surface: &mut S, radius: f64, reading: &ClockReading) -> Result<()> {
    check_radius(radius)?;

    surface.save();
    surface.translate(radius, radius);
    surface.set_line_cap(LineCap::Butt);
    surface.set_line_width(1.0);
    surface.arc(0.0, 0.0, radius, 0.0, std::f64::consts::TAU);
    surface.stroke()?;

    for i in 0..TICKS {
        draw_tick(surface, i, i % 5 == 0, radius)?;
    }

    surface.set_line_cap(LineCap::Round);
    draw_hand(surface, reading.hour_units(), TICKS as f64, radius * HOUR_HAND, 2.0)?;
    draw_hand(surface, reading.minute as f64, TICKS as f64, radius * MINUTE_HAND, 1.0)?;
    surface.restore();
    Ok(())
}

/// Wedge ring showing `value` of `full` units, each wedge a flat blend of the
/// day/night colors.
pub fn render_ring<S: Surface>(
    surface: &mut S,
    radius: f64,
    value: u32,
    full: u32,
    ring: Ring,
    colors: &DayNight,
    reading: &ClockReading,
) -> Result<()> {
    check_radius(radius)?;
    if full == 0 {
        return Ok(());
    }
    let (inner, outer) = ring.radii();
    let (inner, outer) = (inner * radius, outer * radius);

    surface.save();
    surface.translate(radius, radius);
    for i in 0..value.min(full) {
        let start = clock_to_arc_angle(i as f64, full as f64);
        let end = clock_to_arc_angle((i + 1) as f64, full as f64);
        surface.arc(0.0, 0.0, outer, start, end);
        surface.arc_negative(0.0, 0.0, inner, end, start);
        surface.close_path();
        let color = colors.wedge_color(i, full, reading);
        surface.set_source_rgb(color.red(), color.green(), color.blue());
        surface.fill()?;
    }
    surface.restore();
    Ok(())
}

/// Empty formats fall back to the locale time, literal `\n` becomes a line break.
pub fn effective_format(format: &str) -> String {
    if format.is_empty() {
        return "%X".to_string();
    }
    format.replace("\\n", "\n")
}

/// Formatted time, centered on (radius, radius) when radius > 0, else top-left.
pub fn render_digital<S: Surface>(
    surface: &mut S,
    font: &FontSpec,
    format: &str,
    radius: f64,
    now: &DateTime<FixedOffset>,
    locale: Locale,
) -> Result<()> {
    let layout = digital_layout(surface, font, format, now, locale)?;
    if radius > 0.0 {
        let (w, h) = layout.pixel_size();
        surface.move_to(radius - w as f64 / 2.0, radius - h as f64 / 2.0);
    } else {
        surface.move_to(0.0, 0.0);
    }
    surface.show_layout(&layout)
}

fn digital_layout<S: Surface>(
    surface: &S,
    font: &FontSpec,
    format: &str,
    now: &DateTime<FixedOffset>,
    locale: Locale,
) -> Result<S::Layout> {
    let text = format_datetime(now, &effective_format(format), locale)?;
    let mut layout = surface.create_layout();
    layout.set_font(font);
    layout.set_line_spacing(DIGITAL_LINE_SPACING);
    layout.set_text(&text);
    Ok(layout)
}

/// One clock, analog and digital parts switched independently.
#[derive(Debug, Clone)]
pub struct ClockWidget {
    pub font: FontSpec,
    pub color: ColorTriple,
    pub radius: f64,
    pub format: String,
    pub analog: bool,
    pub digital: bool,
    pub hour_ring: bool,
    pub minute_ring: bool,
    pub colors: DayNight,
    pub locale: Locale,
}

impl ClockWidget {
    pub fn new(font: FontSpec, color: ColorTriple, locale: Locale) -> Self {
        Self {
            font,
            color,
            radius: 160.0,
            format: "%X".to_string(),
            analog: true,
            digital: false,
            hour_ring: false,
            minute_ring: false,
            colors: DayNight::default(),
            locale,
        }
    }

    /// Reject settings that would make every draw fail.
    pub fn validate(&self) -> Result<()> {
        if self.analog {
            check_radius(self.radius)?;
        }
        if self.digital {
            validate_format(&effective_format(&self.format))?;
        }
        Ok(())
    }
}

impl Widget for ClockWidget {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn height<S: Surface>(&self, surface: &S, now: &DateTime<FixedOffset>) -> Result<f64> {
        let analog = if self.analog { 2.0 * self.radius } else { 0.0 };
        let digital = if self.digital {
            let layout = digital_layout(surface, &self.font, &self.format, now, self.locale)?;
            layout.pixel_size().1 as f64
        } else {
            0.0
        };
        Ok(analog.max(digital))
    }

    fn draw<S: Surface>(&self, surface: &mut S, now: &DateTime<FixedOffset>) -> Result<()> {
        let reading = ClockReading::from_time(now);
        let [r, g, b] = self.color.0;

        if self.analog {
            if self.hour_ring {
                let value = reading.hour_ring_units();
                render_ring(surface, self.radius, value, TICKS, Ring::Inner, &self.colors, &reading)?;
            }
            if self.minute_ring {
                render_ring(surface, self.radius, reading.minute, TICKS, Ring::Outer, &self.colors, &reading)?;
            }
            surface.set_source_rgb(r, g, b);
            render_analog(surface, self.radius, &reading)?;
        }

        if self.digital {
            let (alpha, center) = if self.analog {
                (DIGITAL_OVER_DIAL_ALPHA, self.radius)
            } else {
                (1.0, 0.0)
            };
            surface.set_source_rgba(r, g, b, alpha);
            render_digital(surface, &self.font, &self.format, center, now, self.locale)?;
        }
        Ok(())
    }
}
