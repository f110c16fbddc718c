/// Immediate-mode drawing surface used by the widgets, with a tiny-skia backend.
/// Angles follow the Cairo convention: radians from +x, clockwise on a y-down surface.
use std::f64::consts::TAU;

use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::error::{Result, WidgetError};
use crate::render::text::{FontBook, GlyphLayout, TextLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
}

pub trait Surface {
    type Layout: TextLayout;

    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    /// Arc of increasing angle, joined to the current point by a line.
    fn arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64);
    /// Arc of decreasing angle, joined to the current point by a line.
    fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64);
    fn close_path(&mut self);
    /// Drop the current path and current point.
    fn new_path(&mut self);
    /// Stroke and clear the current path.
    fn stroke(&mut self) -> Result<()>;
    /// Fill and clear the current path.
    fn fill(&mut self) -> Result<()>;
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_source_rgba(&mut self, r: f64, g: f64, b: f64, a: f64);
    fn set_source_rgb(&mut self, r: f64, g: f64, b: f64) {
        self.set_source_rgba(r, g, b, 1.0);
    }
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, tx: f64, ty: f64);
    fn create_layout(&self) -> Self::Layout;
    /// Render the layout with its top-left corner at the current point.
    fn show_layout(&mut self, layout: &Self::Layout) -> Result<()>;
}

/// Sweep of an arc from angle1 to angle2 after Cairo's normalisation.
pub(crate) fn arc_sweep(angle1: f64, angle2: f64, negative: bool) -> f64 {
    let mut end = angle2;
    if negative {
        while end > angle1 {
            end -= TAU;
        }
    } else {
        while end < angle1 {
            end += TAU;
        }
    }
    end - angle1
}

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    origin: (f64, f64),
    line_width: f64,
    line_cap: LineCap,
    color: [f64; 4],
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            origin: (0.0, 0.0),
            line_width: 2.0,
            line_cap: LineCap::Butt,
            color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Surface drawing into a tiny-skia pixmap. Only translations are supported,
/// so the path is kept in device space.
pub struct PixmapSurface<'p, 'f> {
    pixmap: &'p mut Pixmap,
    fonts: &'f FontBook,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    path: PathBuilder,
    current: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
}

impl<'p, 'f> PixmapSurface<'p, 'f> {
    pub fn new(pixmap: &'p mut Pixmap, fonts: &'f FontBook) -> Self {
        Self {
            pixmap,
            fonts,
            state: GraphicsState::default(),
            stack: Vec::new(),
            path: PathBuilder::new(),
            current: None,
            subpath_start: None,
        }
    }

    fn to_device(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.state.origin.0, y + self.state.origin.1)
    }

    fn device_move(&mut self, p: (f64, f64)) {
        self.path.move_to(p.0 as f32, p.1 as f32);
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn device_line(&mut self, p: (f64, f64)) {
        if self.current.is_none() {
            self.device_move(p);
            return;
        }
        self.path.line_to(p.0 as f32, p.1 as f32);
        self.current = Some(p);
    }

    fn flatten_arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, sweep: f64) {
        let (cx, cy) = self.to_device(xc, yc);
        let segments = ((sweep.abs() / (TAU / 128.0)).ceil() as usize).max(1);
        for i in 0..=segments {
            let a = angle1 + sweep * i as f64 / segments as f64;
            self.device_line((cx + radius * a.cos(), cy + radius * a.sin()));
        }
    }

    fn paint(&self) -> Result<Paint<'static>> {
        let [r, g, b, a] = self.state.color;
        let color = Color::from_rgba(r as f32, g as f32, b as f32, a as f32).ok_or_else(|| {
            WidgetError::Backend(format!("invalid source color {:?}", self.state.color))
        })?;
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        Ok(paint)
    }

    fn take_path(&mut self) -> Option<tiny_skia::Path> {
        self.current = None;
        self.subpath_start = None;
        std::mem::take(&mut self.path).finish()
    }
}

impl<'f> Surface for PixmapSurface<'_, 'f> {
    type Layout = GlyphLayout<'f>;

    fn move_to(&mut self, x: f64, y: f64) {
        let p = self.to_device(x, y);
        self.device_move(p);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let p = self.to_device(x, y);
        self.device_line(p);
    }

    fn arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        let sweep = arc_sweep(angle1, angle2, false);
        self.flatten_arc(xc, yc, radius, angle1, sweep);
    }

    fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        let sweep = arc_sweep(angle1, angle2, true);
        self.flatten_arc(xc, yc, radius, angle1, sweep);
    }

    fn close_path(&mut self) {
        if self.current.is_some() {
            self.path.close();
            self.current = self.subpath_start;
        }
    }

    fn new_path(&mut self) {
        self.take_path();
    }

    fn stroke(&mut self) -> Result<()> {
        let paint = self.paint()?;
        let Some(path) = self.take_path() else {
            return Ok(());
        };
        let stroke = Stroke {
            width: self.state.line_width as f32,
            line_cap: match self.state.line_cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
            },
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        Ok(())
    }

    fn fill(&mut self) -> Result<()> {
        let paint = self.paint()?;
        let Some(path) = self.take_path() else {
            return Ok(());
        };
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        Ok(())
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    fn set_source_rgba(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.state.color = [r, g, b, a];
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        self.state.origin.0 += tx;
        self.state.origin.1 += ty;
    }

    fn create_layout(&self) -> GlyphLayout<'f> {
        GlyphLayout::new(self.fonts)
    }

    fn show_layout(&mut self, layout: &GlyphLayout<'f>) -> Result<()> {
        let (x, y) = self.current.unwrap_or(self.state.origin);
        let [r, g, b, a] = self.state.color;
        if ![r, g, b, a].iter().all(|c| (0.0..=1.0).contains(c)) {
            return Err(WidgetError::Backend(format!(
                "invalid source color {:?}",
                self.state.color
            )));
        }
        layout.rasterize(self.pixmap, x as f32, y as f32, [r as f32, g as f32, b as f32, a as f32]);
        Ok(())
    }
}
