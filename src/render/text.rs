/// Text layout collaborator: font specs, loaded faces and rusttype glyph layout.
use std::fmt;
use std::path::Path;

use rusttype::{point, Font, Scale, VMetrics};
use tiny_skia::Pixmap;
use tracing::{info, warn};

use crate::error::{Result, WidgetError};

/// Pixels per point at the 96 dpi resolution desktop text renders at.
const PX_PER_PT: f32 = 96.0 / 72.0;

const STYLE_WORDS: &[&str] = &[
    "regular", "normal", "book", "medium", "bold", "italic", "oblique", "light", "heavy",
];

/// Font description in the "Family Style Size" form, e.g. `Sans Bold 12`.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
    /// Size in points
    pub size: f32,
}

impl FontSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let malformed = || WidgetError::MalformedFontSpec(spec.to_string());

        let mut words: Vec<&str> = spec.split_whitespace().collect();
        let size = words
            .pop()
            .and_then(|w| w.trim_end_matches("px").parse::<f32>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
            .ok_or_else(malformed)?;

        let mut bold = false;
        let mut italic = false;
        while let Some(last) = words.last() {
            let word = last.to_ascii_lowercase();
            if !STYLE_WORDS.contains(&word.as_str()) {
                break;
            }
            match word.as_str() {
                "bold" | "heavy" => bold = true,
                "italic" | "oblique" => italic = true,
                _ => {}
            }
            words.pop();
        }

        let family = words.join(" ").trim_end_matches(',').trim().to_string();
        Ok(Self {
            family: if family.is_empty() { "Sans".to_string() } else { family },
            bold,
            italic,
            size,
        })
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            size: self.size * factor,
            ..self.clone()
        }
    }

    pub fn with_bold(&self, bold: bool) -> Self {
        Self {
            bold,
            ..self.clone()
        }
    }

    pub fn pixel_size(&self) -> f32 {
        self.size * PX_PER_PT
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Sans".to_string(),
            bold: false,
            italic: false,
            size: 12.0,
        }
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.family)?;
        if self.bold {
            write!(f, " Bold")?;
        }
        if self.italic {
            write!(f, " Italic")?;
        }
        write!(f, " {}", self.size)
    }
}

/// Operations the widgets need from a text layout engine.
pub trait TextLayout {
    fn set_font(&mut self, font: &FontSpec);
    /// Baseline distance as a factor of the font height; 0 keeps the natural spacing.
    fn set_line_spacing(&mut self, factor: f32);
    fn set_text(&mut self, text: &str);
    /// Logical extent in whole pixels (width, height).
    fn pixel_size(&self) -> (i32, i32);
    /// Distance from the layout top to the first baseline in pixels.
    fn baseline(&self) -> i32;
}

/// Loaded font faces. Family names in a `FontSpec` are informational;
/// weight selects between the regular and bold face.
pub struct FontBook {
    regular: Font<'static>,
    bold: Option<Font<'static>>,
}

impl FontBook {
    pub fn load(regular: &Path, bold: Option<&Path>) -> Result<Self> {
        let regular_font = load_font(regular)?;
        let bold_font = match bold {
            Some(path) => match load_font(path) {
                Ok(font) => Some(font),
                Err(e) => {
                    warn!("Bold face unavailable, using regular: {}", e);
                    None
                }
            },
            None => None,
        };
        info!(
            "Loaded fonts: regular={}, bold={}",
            regular.display(),
            bold.map(|p| p.display().to_string()).unwrap_or_else(|| "-".into())
        );
        Ok(Self::from_fonts(regular_font, bold_font))
    }

    /// DejaVu Sans regular and bold, compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let regular = Font::try_from_bytes(include_bytes!("../../assets/DejaVuSans.ttf") as &[u8]);
        let bold = Font::try_from_bytes(include_bytes!("../../assets/DejaVuSans-Bold.ttf") as &[u8]);
        match regular {
            Some(regular) => Ok(Self::from_fonts(regular, bold)),
            None => Err(WidgetError::FontLoad {
                path: "<builtin>".to_string(),
                reason: "embedded DejaVuSans.ttf is not a valid font".to_string(),
            }),
        }
    }

    pub fn from_fonts(regular: Font<'static>, bold: Option<Font<'static>>) -> Self {
        Self { regular, bold }
    }

    pub fn face(&self, spec: &FontSpec) -> &Font<'static> {
        match (&self.bold, spec.bold) {
            (Some(bold), true) => bold,
            _ => &self.regular,
        }
    }
}

fn load_font(path: &Path) -> Result<Font<'static>> {
    let data = std::fs::read(path).map_err(|e| WidgetError::FontLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Font::try_from_vec(data).ok_or_else(|| WidgetError::FontLoad {
        path: path.display().to_string(),
        reason: "not a TrueType/OpenType font".to_string(),
    })
}

/// rusttype-backed layout bound to a `FontBook`.
pub struct GlyphLayout<'f> {
    fonts: &'f FontBook,
    font: FontSpec,
    line_spacing: f32,
    text: String,
}

impl<'f> GlyphLayout<'f> {
    pub fn new(fonts: &'f FontBook) -> Self {
        Self {
            fonts,
            font: FontSpec::default(),
            line_spacing: 0.0,
            text: String::new(),
        }
    }

    fn metrics(&self) -> (&'f Font<'static>, Scale, VMetrics) {
        let face = self.fonts.face(&self.font);
        let scale = Scale::uniform(self.font.pixel_size());
        (face, scale, face.v_metrics(scale))
    }

    fn line_height(v: &VMetrics) -> f32 {
        v.ascent - v.descent + v.line_gap
    }

    fn line_advance(&self, v: &VMetrics) -> f32 {
        if self.line_spacing > 0.0 {
            Self::line_height(v) * self.line_spacing
        } else {
            Self::line_height(v)
        }
    }

    fn line_width(face: &Font<'static>, scale: Scale, line: &str) -> f32 {
        face.layout(line, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    /// Blend the glyphs onto the pixmap with the layout's top-left at (x, y).
    /// `color` is straight RGBA in [0,1].
    pub fn rasterize(&self, target: &mut Pixmap, x: f32, y: f32, color: [f32; 4]) {
        let (face, scale, v) = self.metrics();
        let advance = self.line_advance(&v);

        let tw = target.width() as i32;
        let th = target.height() as i32;
        let data = target.data_mut();

        for (i, line) in self.text.split('\n').enumerate() {
            let baseline = y + v.ascent + i as f32 * advance;
            for glyph in face.layout(line, scale, point(x, baseline)) {
                let Some(bb) = glyph.pixel_bounding_box() else {
                    continue;
                };
                glyph.draw(|gx, gy, coverage| {
                    let px = bb.min.x + gx as i32;
                    let py = bb.min.y + gy as i32;
                    if px < 0 || px >= tw || py < 0 || py >= th {
                        return;
                    }
                    let sa = coverage * color[3];
                    if sa <= 0.0 {
                        return;
                    }
                    // pixmap data is premultiplied RGBA
                    let idx = ((py * tw + px) * 4) as usize;
                    for c in 0..3 {
                        let src = color[c] * sa * 255.0;
                        data[idx + c] = (src + data[idx + c] as f32 * (1.0 - sa)).round() as u8;
                    }
                    data[idx + 3] = (sa * 255.0 + data[idx + 3] as f32 * (1.0 - sa)).round() as u8;
                });
            }
        }
    }
}

impl TextLayout for GlyphLayout<'_> {
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
        let (face, scale, v) = self.metrics();
        let lines: Vec<&str> = self.text.split('\n').collect();
        let width = lines
            .iter()
            .map(|line| Self::line_width(face, scale, line))
            .fold(0.0_f32, f32::max);
        let height =
            Self::line_height(&v) + (lines.len().saturating_sub(1)) as f32 * self.line_advance(&v);
        (width.ceil() as i32, height.ceil() as i32)
    }

    fn baseline(&self) -> i32 {
        let (_, _, v) = self.metrics();
        v.ascent.round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_family_style_size() {
        let spec = FontSpec::parse("DejaVu Sans Bold 14").unwrap();
        assert_eq!(spec.family, "DejaVu Sans");
        assert!(spec.bold);
        assert!(!spec.italic);
        assert_eq!(spec.size, 14.0);
    }

    #[test]
    fn test_parse_size_only() {
        let spec = FontSpec::parse("10").unwrap();
        assert_eq!(spec.family, "Sans");
        assert_eq!(spec.size, 10.0);
    }

    #[test]
    fn test_parse_italic_and_comma() {
        let spec = FontSpec::parse("Serif, Bold Italic 9.5").unwrap();
        assert_eq!(spec.family, "Serif");
        assert!(spec.bold && spec.italic);
        assert_eq!(spec.size, 9.5);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(FontSpec::parse("").is_err());
        assert!(FontSpec::parse("Sans").is_err());
        assert!(FontSpec::parse("Sans -3").is_err());
        assert!(FontSpec::parse("Sans 0").is_err());
    }

    #[test]
    fn test_scaled_and_display() {
        let spec = FontSpec::parse("Sans 20").unwrap();
        let small = spec.scaled(0.6);
        assert!((small.size - 12.0).abs() < 1e-4);
        assert_eq!(small.family, "Sans");
        assert_eq!(spec.with_bold(true).to_string(), "Sans Bold 20");
        assert!((spec.pixel_size() - 80.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_builtin_layout_measures_text() {
        let fonts = FontBook::builtin().unwrap();
        let mut layout = GlyphLayout::new(&fonts);
        layout.set_font(&FontSpec::parse("Sans 12").unwrap());
        layout.set_text("M");
        let (w, h) = layout.pixel_size();
        assert!(w > 0 && h > 0);
        assert!(layout.baseline() > 0 && layout.baseline() <= h);

        layout.set_text("MM");
        let (w2, _) = layout.pixel_size();
        assert!(w2 > w);

        // two lines at 1.2 spacing are taller than two natural lines
        layout.set_text("M\nM");
        let (_, natural) = layout.pixel_size();
        layout.set_line_spacing(1.2);
        let (_, spaced) = layout.pixel_size();
        assert!(natural > h);
        assert!(spaced > natural);
    }

    #[test]
    fn test_bold_face_is_wider() {
        let fonts = FontBook::builtin().unwrap();
        let mut layout = GlyphLayout::new(&fonts);
        layout.set_font(&FontSpec::parse("Sans 40").unwrap());
        layout.set_text("88888888");
        let (regular, _) = layout.pixel_size();
        layout.set_font(&FontSpec::parse("Sans Bold 40").unwrap());
        let (bold, _) = layout.pixel_size();
        assert!(bold > regular);
    }

    #[test]
    fn test_missing_font_file() {
        let err = FontBook::load(Path::new("/nonexistent/font.ttf"), None);
        assert!(matches!(err, Err(WidgetError::FontLoad { .. })));
    }
}
