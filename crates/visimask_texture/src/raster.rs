//! Pixel raster with canvas-style drawing
//!
//! Shapes are aliased; text is antialiased through glyph coverage.

use image::{Rgba, RgbaImage};

use crate::error::TextureError;
use crate::font;

/// Parse `#rgb` or `#rrggbb` into an opaque color
pub fn parse_hex_color(s: &str) -> Result<Rgba<u8>, TextureError> {
    let invalid = || TextureError::InvalidColor(s.to_string());
    let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |i: usize, len: usize| -> Result<u8, TextureError> {
        let v = u8::from_str_radix(&hex[i * len..(i + 1) * len], 16).map_err(|_| invalid())?;
        Ok(if len == 1 { v * 17 } else { v })
    };

    match hex.len() {
        3 => Ok(Rgba([channel(0, 1)?, channel(1, 1)?, channel(2, 1)?, 255])),
        6 => Ok(Rgba([channel(0, 2)?, channel(1, 2)?, channel(2, 2)?, 255])),
        _ => Err(invalid()),
    }
}

/// Drawing surface over an RGBA8 image
///
/// Coordinates are in pixels with the origin at the top-left. A pixel is
/// covered by a shape when its center lies inside it, so adjacent rectangles
/// never leave gaps or overlap.
#[derive(Clone, Debug)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Create a transparent canvas
    pub fn new(width: u32, height: u32) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidSize { width, height });
        }
        Ok(Self { image: RgbaImage::new(width, height) })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Fill the rectangle `[x, x + w) x [y, y + h)`
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let (x0, x1) = covered_span(x, x + w, self.width());
        let (y0, y1) = covered_span(y, y + h, self.height());
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, color);
            }
        }
    }

    /// Stroke a rectangle outline centered on its edges
    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, line_width: f32, color: Rgba<u8>) {
        let half = line_width / 2.0;
        self.fill_rect(x - half, y - half, w + line_width, line_width, color);
        self.fill_rect(x - half, y + h - half, w + line_width, line_width, color);
        self.fill_rect(x - half, y - half, line_width, h + line_width, color);
        self.fill_rect(x + w - half, y - half, line_width, h + line_width, color);
    }

    /// Horizontal line from `x0` to `x1` at height `y`
    pub fn hline(&mut self, y: f32, x0: f32, x1: f32, line_width: f32, color: Rgba<u8>) {
        let (a, b) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        self.fill_rect(a, y - line_width / 2.0, b - a, line_width, color);
    }

    /// Vertical line from `y0` to `y1` at `x`
    pub fn vline(&mut self, x: f32, y0: f32, y1: f32, line_width: f32, color: Rgba<u8>) {
        let (a, b) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        self.fill_rect(x - line_width / 2.0, a, line_width, b - a, color);
    }

    /// Draw text with the top of its em box at `(x, y)`, blending glyph coverage
    pub fn fill_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: Rgba<u8>) -> Result<(), TextureError> {
        let font = font::label_font()?;
        let (w, h) = (self.width() as i64, self.height() as i64);
        let image = &mut self.image;
        font::rasterize(&font, text, x, y, font_size, |px, py, coverage| {
            if (0..w).contains(&px) && (0..h).contains(&py) {
                let pixel = image.get_pixel_mut(px as u32, py as u32);
                *pixel = blend_over(*pixel, color, coverage);
            }
        });
        Ok(())
    }
}

/// Source-over compositing of `src` at `coverage` onto `dst`
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let sa = coverage * src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| {
        let c = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([channel(0), channel(1), channel(2), (out_a * 255.0).round() as u8])
}

/// Pixel indices whose centers fall in `[a, b)`, clipped to `[0, size)`
fn covered_span(a: f32, b: f32, size: u32) -> (u32, u32) {
    let first = (a - 0.5).ceil().max(0.0);
    let end = (b - 0.5).ceil().clamp(0.0, size as f32);
    if !(first < end) {
        return (0, 0);
    }
    (first as u32, end as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#0000ff").unwrap(), Rgba([0, 0, 255, 255]));
        assert_eq!(parse_hex_color("#2222FF").unwrap(), Rgba([0x22, 0x22, 0xff, 255]));
        assert_eq!(parse_hex_color("#fff").unwrap(), Rgba([255, 255, 255, 255]));
        assert!(parse_hex_color("0000ff").is_err());
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
        assert!(parse_hex_color("#ÿÿÿ").is_err());
    }

    #[test]
    fn test_zero_size_canvas_is_error() {
        assert!(matches!(Canvas::new(0, 4), Err(TextureError::InvalidSize { .. })));
    }

    #[test]
    fn test_fill_rect_pixel_centers() {
        let mut c = Canvas::new(4, 4).unwrap();
        c.fill_rect(1.0, 1.0, 2.0, 2.0, RED);
        assert_eq!(c.pixel(1, 1), RED);
        assert_eq!(c.pixel(2, 2), RED);
        assert_eq!(c.pixel(0, 0)[3], 0);
        assert_eq!(c.pixel(3, 3)[3], 0);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut c = Canvas::new(2, 2).unwrap();
        c.fill_rect(-10.0, -10.0, 100.0, 100.0, RED);
        assert_eq!(c.pixel(1, 1), RED);
        c.fill_rect(5.0, 5.0, -3.0, 1.0, Rgba([0, 0, 0, 255]));
        assert_eq!(c.pixel(1, 1), RED);
    }

    #[test]
    fn test_stroke_rect_border_band() {
        // Inset by half the line width, the stroke covers the outer 2 pixels
        let mut c = Canvas::new(8, 8).unwrap();
        c.stroke_rect(1.0, 1.0, 6.0, 6.0, 2.0, RED);
        assert_eq!(c.pixel(0, 4), RED);
        assert_eq!(c.pixel(1, 4), RED);
        assert_eq!(c.pixel(2, 4)[3], 0);
        assert_eq!(c.pixel(7, 7), RED);
    }

    #[test]
    fn test_lines() {
        let mut c = Canvas::new(8, 8).unwrap();
        c.hline(4.0, 0.0, 8.0, 2.0, RED);
        assert_eq!(c.pixel(0, 3), RED);
        assert_eq!(c.pixel(7, 4), RED);
        assert_eq!(c.pixel(0, 5)[3], 0);
        c.vline(1.0, 8.0, 0.0, 2.0, RED);
        assert_eq!(c.pixel(0, 0), RED);
    }

    #[test]
    fn test_fill_text_clips_at_edges() {
        let mut c = Canvas::new(16, 16).unwrap();
        c.fill_text("W", -4.0, -4.0, 16.0, RED).unwrap();
        let covered = (0..16).flat_map(|y| (0..16).map(move |x| (x, y))).any(|(x, y)| c.pixel(x, y)[3] > 0);
        assert!(covered);

        let before = c.image().clone();
        c.fill_text("W", 100.0, 100.0, 16.0, RED).unwrap();
        assert_eq!(c.image(), &before);
    }

    #[test]
    fn test_blend_over() {
        let blue = Rgba([0, 0, 255, 255]);
        assert_eq!(blend_over(blue, RED, 1.0), RED);
        assert_eq!(blend_over(blue, RED, 0.0), blue);

        let half = blend_over(blue, RED, 0.5);
        assert_eq!(half[3], 255, "Opaque backgrounds stay opaque");
        assert!((126..=129).contains(&half[0]));
        assert!((126..=129).contains(&half[2]));

        assert_eq!(blend_over(Rgba([0, 0, 0, 0]), RED, 1.0), RED);
    }
}
