// text.rs - Caption Text Rendering
// Rasterises caption and title text straight onto the RGB canvas using
// ab_glyph outlines with per-pixel coverage blending.
//
// Text is anchored "middle-ascender": x is the horizontal centre of the line,
// y is the top of the font's ascender.

use std::path::Path;

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};

use super::error::PreviewError;

pub const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

pub struct CaptionFont {
    font: FontVec,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl CaptionFont {
    /// Load a TTF/OTF font from disk. A failure here is a configuration error.
    pub fn load(path: &Path) -> Result<Self, PreviewError> {
        let bytes = std::fs::read(path).map_err(|e| PreviewError::AssetLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(bytes).map_err(|reason| PreviewError::AssetLoad {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, String> {
        let font = FontVec::try_from_vec(bytes).map_err(|e| e.to_string())?;
        Ok(Self { font })
    }

    /// Advance width of a single line, kerning included
    pub fn text_width(&self, text: &str, px: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(px));
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }

    pub fn line_height(&self, px: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(px));
        scaled.ascent() - scaled.descent()
    }

    /// Draw one line centred on `center_x` with its ascender at `top`
    pub fn draw_line(&self, canvas: &mut RgbImage, text: &str, center_x: f32, top: f32, px: f32, color: Rgb<u8>) {
        let scale = PxScale::from(px);
        let scaled = self.font.as_scaled(scale);
        let baseline = top + scaled.ascent();
        let mut x = center_x - self.text_width(text, px) / 2.0;
        let mut previous = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                x += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(x, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let cx = bounds.min.x as i64 + gx as i64;
                    let cy = bounds.min.y as i64 + gy as i64;
                    blend_pixel(canvas, cx, cy, color, coverage);
                });
            }
            x += scaled.h_advance(id);
            previous = Some(id);
        }
    }

    /// Draw several lines, each centred, stacked with `spacing` pixels between them
    pub fn draw_multiline<S: AsRef<str>>(
        &self,
        canvas: &mut RgbImage,
        lines: &[S],
        center_x: f32,
        top: f32,
        px: f32,
        spacing: f32,
        color: Rgb<u8>,
    ) {
        let step = self.line_height(px) + spacing;
        for (i, line) in lines.iter().enumerate() {
            self.draw_line(canvas, line.as_ref(), center_x, top + step * i as f32, px, color);
        }
    }
}

fn blend_pixel(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for channel in 0..3 {
        let bg = pixel.0[channel] as f32;
        let fg = color.0[channel] as f32;
        pixel.0[channel] = (bg + (fg - bg) * alpha).round() as u8;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_font() -> CaptionFont {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/fonts/DejaVuSans.ttf");
        CaptionFont::load(&path).unwrap()
    }

    fn dark_pixels(canvas: &RgbImage) -> Vec<(u32, u32)> {
        canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] < 128)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn test_load_missing_font_is_asset_error() {
        let err = CaptionFont::load(Path::new("resources/fonts/does-not-exist.ttf")).unwrap_err();
        assert!(matches!(err, PreviewError::AssetLoad { .. }));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(CaptionFont::from_bytes(b"definitely not a font".to_vec()).is_err());
    }

    #[test]
    fn test_text_width_grows_with_text() {
        let font = test_font();
        assert_eq!(font.text_width("", 16.0), 0.0);
        assert!(font.text_width("Pid: 1", 16.0) < font.text_width("Pid: 123456789", 16.0));
        assert!(font.text_width("Pid", 16.0) < font.text_width("Pid", 50.0));
    }

    #[test]
    fn test_draw_line_is_centred() {
        let font = test_font();
        let mut canvas = RgbImage::from_pixel(200, 40, Rgb([255, 255, 255]));
        font.draw_line(&mut canvas, "HHHH", 100.0, 5.0, 16.0, TEXT_COLOR);

        let dark = dark_pixels(&canvas);
        assert!(!dark.is_empty());
        let min_x = dark.iter().map(|(x, _)| *x).min().unwrap() as i64;
        let max_x = dark.iter().map(|(x, _)| *x).max().unwrap() as i64;
        let center = (min_x + max_x) / 2;
        assert!((center - 100).abs() <= 3, "text centre at {}", center);
        assert!(dark.iter().all(|(_, y)| *y >= 5));
    }

    #[test]
    fn test_draw_outside_canvas_is_clipped() {
        let font = test_font();
        let mut canvas = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        font.draw_line(&mut canvas, "Wide text that overflows", 5.0, -4.0, 30.0, TEXT_COLOR);
        assert_eq!(canvas.dimensions(), (10, 10));
    }
}
