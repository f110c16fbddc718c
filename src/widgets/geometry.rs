/// Angle and color helpers shared by the clock faces.
use std::f64::consts::TAU;

use crate::error::{Result, WidgetError};

/// Map a cyclic value onto a unit vector, 0 at 12 o'clock, turning clockwise.
/// Returns (sin a, -cos a) for a y-down surface.
pub fn angle_to_unit_vector(value: f64, full: f64) -> (f64, f64) {
    if full <= 0.0 {
        return (0.0, -1.0);
    }
    let angle = TAU * value / full;
    (angle.sin(), -angle.cos())
}

/// Cairo arc angle (radians from +x) for a clock angle given as value/full.
pub fn clock_to_arc_angle(value: f64, full: f64) -> f64 {
    TAU * value / full - TAU / 4.0
}

/// Three float channels in [0,1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTriple(pub [f64; 3]);

impl ColorTriple {
    /// Blue used at midnight.
    pub const NIGHT: ColorTriple = ColorTriple([0.1, 0.3, 0.8]);
    /// Gold used at noon.
    pub const NOON: ColorTriple = ColorTriple([0.9, 0.7, 0.1]);

    pub fn from_slice(channels: &[f64]) -> Result<Self> {
        match channels {
            [r, g, b] => Ok(Self([*r, *g, *b])),
            _ => Err(WidgetError::MalformedColor(format!("{channels:?}"))),
        }
    }

    /// Parse `#rrggbb` or `r,g,b` with float channels.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(WidgetError::MalformedColor(s.to_string()));
            }
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16)
                    .map(|v| v as f64 / 255.0)
                    .map_err(|_| WidgetError::MalformedColor(s.to_string()))
            };
            return Ok(Self([channel(0..2)?, channel(2..4)?, channel(4..6)?]));
        }

        let channels = s
            .split(',')
            .map(|c| c.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| WidgetError::MalformedColor(s.to_string()))?;
        if channels.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(WidgetError::MalformedColor(s.to_string()));
        }
        Self::from_slice(&channels).map_err(|_| WidgetError::MalformedColor(s.to_string()))
    }

    pub fn red(&self) -> f64 {
        self.0[0]
    }

    pub fn green(&self) -> f64 {
        self.0[1]
    }

    pub fn blue(&self) -> f64 {
        self.0[2]
    }
}

/// Linear blend of two colors, each channel clamped to the span of its inputs.
pub fn mix_color(a: &ColorTriple, b: &ColorTriple, fraction: f64) -> ColorTriple {
    let f = fraction.clamp(0.0, 1.0);
    let mut out = [0.0; 3];
    for (i, channel) in out.iter_mut().enumerate() {
        let (ca, cb) = (a.0[i], b.0[i]);
        let mixed = ca * (1.0 - f) + cb * f;
        *channel = mixed.clamp(ca.min(cb), ca.max(cb));
    }
    ColorTriple(out)
}
