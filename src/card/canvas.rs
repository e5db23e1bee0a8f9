//! The raster surface every card is drawn on.

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba, RgbaImage};
use rand::Rng;
use std::io::Cursor as IoCursor;

use super::fonts::{blend, FontSet, TextStyle};
use super::{CardError, IMAGE_HEIGHT, IMAGE_WIDTH};

pub const BACKGROUND: Rgba<u8> = Rgba([0x00, 0x33, 0x66, 0xFF]);
pub const TEXT_COLOR: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
pub const RULE_COLOR: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0x99]);

const WATERMARK_TEXT: &str = "RENIEC";
const WATERMARK_TILE: (u32, u32) = (160, 60);
const WATERMARK_PITCH: (usize, usize) = (200, 100);
const WATERMARK_MAX_ANGLE: f32 = 15.0;
const WATERMARK_OPACITY: f32 = 0.1;

/// Where layout code sends text. Implemented by [`Canvas`] and by [`DryRun`],
/// which only measures.
pub trait Surface {
    fn fonts(&self) -> &FontSet;

    fn text(&mut self, style: TextStyle, x: i32, y: i32, text: &str);
}

/// A surface that draws nothing, used to project where a block would end.
pub struct DryRun<'f> {
    fonts: &'f FontSet,
}

impl<'f> DryRun<'f> {
    pub fn new(fonts: &'f FontSet) -> Self {
        Self { fonts }
    }
}

impl Surface for DryRun<'_> {
    fn fonts(&self) -> &FontSet {
        self.fonts
    }

    fn text(&mut self, _style: TextStyle, _x: i32, _y: i32, _text: &str) {}
}

/// A 1080×1920 card. Finishing it consumes it, so nothing can be drawn on a
/// canvas once its PNG exists.
pub struct Canvas<'f> {
    image: RgbaImage,
    fonts: &'f FontSet,
}

impl<'f> Canvas<'f> {
    pub fn new(fonts: &'f FontSet) -> Self {
        Self {
            image: ImageBuffer::from_pixel(IMAGE_WIDTH, IMAGE_HEIGHT, BACKGROUND),
            fonts,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Alpha-blend a filled rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba<u8>) {
        let a = color.0[3] as f32 / 255.0;
        for py in y.max(0)..(y + h as i32).min(IMAGE_HEIGHT as i32) {
            for px in x.max(0)..(x + w as i32).min(IMAGE_WIDTH as i32) {
                blend(self.image.get_pixel_mut(px as u32, py as u32), color, a);
            }
        }
    }

    /// Composite `over` at `(x, y)` honouring its alpha, scaled by `opacity`.
    pub fn overlay(&mut self, over: &RgbaImage, x: i32, y: i32, opacity: f32) {
        for (ox, oy, p) in over.enumerate_pixels() {
            let a = p.0[3] as f32 / 255.0 * opacity;
            if a <= 0.0 {
                continue;
            }
            let bx = x + ox as i32;
            let by = y + oy as i32;
            if bx < 0 || by < 0 || bx >= IMAGE_WIDTH as i32 || by >= IMAGE_HEIGHT as i32 {
                continue;
            }
            blend(self.image.get_pixel_mut(bx as u32, by as u32), *p, a);
        }
    }

    /// Tile the watermark text across the whole card, each tile at its own
    /// random angle.
    pub fn watermark<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (tw, th) = WATERMARK_TILE;
        let mut tile = RgbaImage::new(tw, th);
        self.fonts.face(TextStyle::Watermark).draw_text(
            &mut tile,
            TextStyle::Watermark.px(),
            0,
            0,
            TEXT_COLOR,
            WATERMARK_TEXT,
        );

        for x in (0..IMAGE_WIDTH as i32).step_by(WATERMARK_PITCH.0) {
            for y in (0..IMAGE_HEIGHT as i32).step_by(WATERMARK_PITCH.1) {
                let angle = rng.gen_range(-WATERMARK_MAX_ANGLE..=WATERMARK_MAX_ANGLE);
                let rotated = rotate_about_center(&tile, angle);
                self.overlay(&rotated, x, y, WATERMARK_OPACITY);
            }
        }
    }

    /// Encode the finished card as PNG.
    pub fn finish(self) -> Result<Vec<u8>, CardError> {
        let mut buf = IoCursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.image).write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}

impl Surface for Canvas<'_> {
    fn fonts(&self) -> &FontSet {
        self.fonts
    }

    fn text(&mut self, style: TextStyle, x: i32, y: i32, text: &str) {
        let fonts = self.fonts;
        fonts
            .face(style)
            .draw_text(&mut self.image, style.px(), x, y, TEXT_COLOR, text);
    }
}

/// Nearest-neighbour rotation keeping the source dimensions.
fn rotate_about_center(src: &RgbaImage, degrees: f32) -> RgbaImage {
    let (w, h) = src.dimensions();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);

    ImageBuffer::from_fn(w, h, |x, y| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let sx = cos * dx + sin * dy + cx;
        let sy = -sin * dx + cos * dy + cy;
        if sx >= 0.0 && sy >= 0.0 && (sx as u32) < w && (sy as u32) < h {
            *src.get_pixel(sx as u32, sy as u32)
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::fonts::testing::fixed_fonts;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_canvas_is_filled_with_background() {
        let fonts = fixed_fonts();
        let canvas = Canvas::new(&fonts);
        assert_eq!(canvas.image().dimensions(), (IMAGE_WIDTH, IMAGE_HEIGHT));
        assert_eq!(*canvas.image().get_pixel(500, 900), BACKGROUND);
    }

    #[test]
    fn test_fill_rect_clips_to_canvas() {
        let fonts = fixed_fonts();
        let mut canvas = Canvas::new(&fonts);
        canvas.fill_rect(-10, IMAGE_HEIGHT as i32 - 2, 20, 10, TEXT_COLOR);
        assert_eq!(*canvas.image().get_pixel(0, IMAGE_HEIGHT - 1), TEXT_COLOR);
        assert_eq!(*canvas.image().get_pixel(10, IMAGE_HEIGHT - 1), BACKGROUND);
    }

    #[test]
    fn test_overlay_skips_transparent_pixels() {
        let fonts = fixed_fonts();
        let mut canvas = Canvas::new(&fonts);
        let mut over = RgbaImage::new(2, 1);
        over.put_pixel(1, 0, TEXT_COLOR);
        canvas.overlay(&over, 0, 0, 1.0);
        assert_eq!(*canvas.image().get_pixel(0, 0), BACKGROUND);
        assert_eq!(*canvas.image().get_pixel(1, 0), TEXT_COLOR);
    }

    #[test]
    fn test_rotate_by_zero_is_identity() {
        let mut src = RgbaImage::new(4, 2);
        src.put_pixel(3, 1, TEXT_COLOR);
        assert_eq!(rotate_about_center(&src, 0.0), src);
    }

    #[test]
    fn test_finish_produces_png() {
        let fonts = fixed_fonts();
        let mut canvas = Canvas::new(&fonts);
        canvas.watermark(&mut StdRng::seed_from_u64(7));
        let png = canvas.finish().unwrap();
        assert!(png.starts_with(&[0x89, 0x50, 0x4E, 0x47]));
    }
}
