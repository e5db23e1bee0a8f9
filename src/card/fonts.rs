//! Glyph measurement and rasterisation.

use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::CardError;

const REGULAR_FILE: &str = "DejaVuSans.ttf";
const BOLD_FILE: &str = "DejaVuSans-Bold.ttf";

/// Something that can measure and draw a run of text at a pixel size.
pub trait GlyphSource: Send + Sync {
    /// Horizontal advance of `text` at `px`.
    fn text_width(&self, px: f32, text: &str) -> f32;

    /// Draw `text` with its top-left corner at `(x, y)`.
    fn draw_text(&self, img: &mut RgbaImage, px: f32, x: i32, y: i32, color: Rgba<u8>, text: &str);
}

/// A TrueType face rasterised with `rusttype`.
pub struct TrueTypeGlyphs {
    font: Font<'static>,
}

impl TrueTypeGlyphs {
    pub fn from_file(path: &Path) -> Result<Self, CardError> {
        let bytes = fs::read(path).map_err(|source| CardError::FontIo {
            path: path.to_path_buf(),
            source,
        })?;
        let font =
            Font::try_from_vec(bytes).ok_or_else(|| CardError::FontData(path.to_path_buf()))?;
        Ok(Self { font })
    }
}

impl GlyphSource for TrueTypeGlyphs {
    fn text_width(&self, px: f32, text: &str) -> f32 {
        self.font
            .layout(text, Scale::uniform(px), point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    fn draw_text(&self, img: &mut RgbaImage, px: f32, x: i32, y: i32, color: Rgba<u8>, text: &str) {
        let scale = Scale::uniform(px);
        let ascent = self.font.v_metrics(scale).ascent;
        let (width, height) = (img.width() as i32, img.height() as i32);
        let alpha = color.0[3] as f32 / 255.0;

        for glyph in self.font.layout(text, scale, point(x as f32, y as f32 + ascent)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, v| {
                let dx = gx as i32 + bb.min.x;
                let dy = gy as i32 + bb.min.y;
                if dx < 0 || dy < 0 || dx >= width || dy >= height {
                    return;
                }
                let a = v * alpha;
                if a <= 0.0 {
                    return;
                }
                let dst = img.get_pixel_mut(dx as u32, dy as u32);
                blend(dst, color, a);
            });
        }
    }
}

/// Source-over blend of `color` onto `dst` with coverage `a`.
pub(crate) fn blend(dst: &mut Rgba<u8>, color: Rgba<u8>, a: f32) {
    let inv = 1.0 - a;
    for c in 0..3 {
        dst.0[c] = (color.0[c] as f32 * a + dst.0[c] as f32 * inv) as u8;
    }
    dst.0[3] = (a * 255.0 + dst.0[3] as f32 * inv).min(255.0) as u8;
}

/// Fixed text styles used by the card layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Title,
    Heading,
    Label,
    Body,
    Watermark,
}

impl TextStyle {
    pub fn px(self) -> f32 {
        match self {
            Self::Title => 64.0,
            Self::Heading | Self::Watermark => 32.0,
            Self::Label | Self::Body => 22.0,
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, Self::Title | Self::Heading | Self::Label)
    }
}

/// Regular and bold faces shared read-only by every render.
#[derive(Clone)]
pub struct FontSet {
    regular: Arc<dyn GlyphSource>,
    bold: Arc<dyn GlyphSource>,
}

impl FontSet {
    pub fn new(regular: Arc<dyn GlyphSource>, bold: Arc<dyn GlyphSource>) -> Self {
        Self { regular, bold }
    }

    /// Load `DejaVuSans.ttf` and `DejaVuSans-Bold.ttf` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, CardError> {
        let regular = TrueTypeGlyphs::from_file(&dir.join(REGULAR_FILE))?;
        let bold = TrueTypeGlyphs::from_file(&dir.join(BOLD_FILE))?;
        log::info!("Loaded card fonts from {}", dir.display());
        Ok(Self::new(Arc::new(regular), Arc::new(bold)))
    }

    pub fn face(&self, style: TextStyle) -> &dyn GlyphSource {
        if style.is_bold() {
            self.bold.as_ref()
        } else {
            self.regular.as_ref()
        }
    }

    pub fn measure(&self, style: TextStyle, text: &str) -> f32 {
        self.face(style).text_width(style.px(), text)
    }
}
