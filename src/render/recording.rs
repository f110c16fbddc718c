/// Recording surface for widget tests. Keeps every drawing call in device
/// coordinates and measures text with fixed per-glyph metrics.
use crate::error::{Result, WidgetError};
use crate::render::surface::{arc_sweep, LineCap, Surface};
use crate::render::text::{FontSpec, TextLayout};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Arc {
        center: (f64, f64),
        radius: f64,
        start: f64,
        sweep: f64,
    },
    ClosePath,
    Stroke { width: f64, color: [f64; 4] },
    Fill { color: [f64; 4] },
    ShowLayout {
        text: String,
        font: FontSpec,
        line_spacing: f32,
        at: (f64, f64),
        color: [f64; 4],
    },
}

/// Glyphs are `size / 2` wide, lines `size` high, baseline at `0.8 * size`.
#[derive(Debug, Clone)]
pub struct FakeLayout {
    font: FontSpec,
    line_spacing: f32,
    text: String,
}

impl TextLayout for FakeLayout {
    fn set_font(&mut self, font: &FontSpec) {
        self.font = font.clone();
    }

    fn set_line_spacing(&mut self, factor: f32) {
        self.line_spacing = factor;
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn pixel_size(&self) -> (i32, i32) {
        let lines: Vec<&str> = self.text.split('\n').collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let advance = if self.line_spacing > 0.0 { self.line_spacing } else { 1.0 };
        let height = self.font.size * (1.0 + (lines.len() - 1) as f32 * advance);
        (
            (longest as f32 * self.font.size / 2.0).ceil() as i32,
            height.round() as i32,
        )
    }

    fn baseline(&self) -> i32 {
        (self.font.size * 0.8).round() as i32
    }
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<Op>,
    origin: (f64, f64),
    line_width: f64,
    color: [f64; 4],
    stack: Vec<((f64, f64), f64, [f64; 4])>,
    current: Option<(f64, f64)>,
    /// Makes the next stroke or fill fail, to exercise error propagation.
    pub fail_paint: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            line_width: 2.0,
            color: [0.0, 0.0, 0.0, 1.0],
            ..Self::default()
        }
    }

    pub fn strokes(&self) -> Vec<f64> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Stroke { width, .. } => Some(*width),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> Vec<[f64; 4]> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Fill { color } => Some(*color),
                _ => None,
            })
            .collect()
    }

    /// (text, font, top-left) of every shown layout in draw order.
    pub fn texts(&self) -> Vec<(String, FontSpec, (f64, f64))> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::ShowLayout { text, font, at, .. } => Some((text.clone(), font.clone(), *at)),
                _ => None,
            })
            .collect()
    }

    fn paint(&self) -> Result<()> {
        if self.fail_paint {
            return Err(WidgetError::Backend("recording surface refused to paint".into()));
        }
        Ok(())
    }
}

impl Surface for RecordingSurface {
    type Layout = FakeLayout;

    fn move_to(&mut self, x: f64, y: f64) {
        let p = (x + self.origin.0, y + self.origin.1);
        self.current = Some(p);
        self.ops.push(Op::MoveTo(p.0, p.1));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let p = (x + self.origin.0, y + self.origin.1);
        self.current = Some(p);
        self.ops.push(Op::LineTo(p.0, p.1));
    }

    fn arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        let center = (xc + self.origin.0, yc + self.origin.1);
        let sweep = arc_sweep(angle1, angle2, false);
        let end = angle1 + sweep;
        self.current = Some((center.0 + radius * end.cos(), center.1 + radius * end.sin()));
        self.ops.push(Op::Arc { center, radius, start: angle1, sweep });
    }

    fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        let center = (xc + self.origin.0, yc + self.origin.1);
        let sweep = arc_sweep(angle1, angle2, true);
        let end = angle1 + sweep;
        self.current = Some((center.0 + radius * end.cos(), center.1 + radius * end.sin()));
        self.ops.push(Op::Arc { center, radius, start: angle1, sweep });
    }

    fn close_path(&mut self) {
        self.ops.push(Op::ClosePath);
    }

    fn new_path(&mut self) {
        self.current = None;
    }

    fn stroke(&mut self) -> Result<()> {
        self.paint()?;
        self.current = None;
        self.ops.push(Op::Stroke {
            width: self.line_width,
            color: self.color,
        });
        Ok(())
    }

    fn fill(&mut self) -> Result<()> {
        self.paint()?;
        self.current = None;
        self.ops.push(Op::Fill { color: self.color });
        Ok(())
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    fn set_line_cap(&mut self, _cap: LineCap) {}

    fn set_source_rgba(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.color = [r, g, b, a];
    }

    fn save(&mut self) {
        self.stack.push((self.origin, self.line_width, self.color));
    }

    fn restore(&mut self) {
        if let Some((origin, width, color)) = self.stack.pop() {
            self.origin = origin;
            self.line_width = width;
            self.color = color;
        }
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        self.origin.0 += tx;
        self.origin.1 += ty;
    }

    fn create_layout(&self) -> FakeLayout {
        FakeLayout {
            font: FontSpec::default(),
            line_spacing: 0.0,
            text: String::new(),
        }
    }

    fn show_layout(&mut self, layout: &FakeLayout) -> Result<()> {
        self.ops.push(Op::ShowLayout {
            text: layout.text.clone(),
            font: layout.font.clone(),
            line_spacing: layout.line_spacing,
            at: self.current.unwrap_or(self.origin),
            color: self.color,
        });
        Ok(())
    }
}
