//! Monospace label font
//!
//! DejaVu Sans Mono is embedded in the crate and rasterized with `ab_glyph`.
//! Text is laid out on one line from a top baseline: `y` is the top of the
//! em box, like a 2D canvas with `textBaseline = "top"`.

use ab_glyph::{point, Font, FontRef, GlyphId, PxScale, ScaleFont};

use crate::error::TextureError;

static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// The embedded label font
pub fn label_font() -> Result<FontRef<'static>, TextureError> {
    FontRef::try_from_slice(FONT_DATA).map_err(|e| TextureError::Font(e.to_string()))
}

/// Glyph ids of `text` with the pen position of each, starting at 0
fn layout<F: Font>(font: &F, text: &str, font_size: f32) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(PxScale::from(font_size));
    let mut caret = 0.0;
    let mut previous: Option<GlyphId> = None;
    let mut glyphs = Vec::with_capacity(text.len());
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push((id, caret));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }
    (glyphs, caret)
}

/// Advance width of `text` in pixels
pub fn text_width<F: Font>(font: &F, text: &str, font_size: f32) -> f32 {
    layout(font, text, font_size).1
}

/// Rasterize `text` with the top-left of its em box at `(x, y)`
///
/// `plot` receives absolute pixel coordinates, possibly negative, and a
/// coverage in `[0, 1]`.
pub fn rasterize<F: Font>(
    font: &F,
    text: &str,
    x: f32,
    y: f32,
    font_size: f32,
    mut plot: impl FnMut(i64, i64, f32),
) {
    let scale = PxScale::from(font_size);
    let baseline = y + font.as_scaled(scale).ascent();
    let (glyphs, _) = layout(font, text, font_size);

    for (id, offset) in glyphs {
        let glyph = id.with_scale_and_position(scale, point(x + offset, baseline));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        let (left, top) = (bounds.min.x as i64, bounds.min.y as i64);
        outlined.draw(|gx, gy, coverage| {
            if coverage > 0.0 {
                plot(left + gx as i64, top + gy as i64, coverage.min(1.0));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(text: &str, x: f32, y: f32, size: f32) -> Option<(i64, i64, i64, i64)> {
        let font = label_font().unwrap();
        let mut bounds: Option<(i64, i64, i64, i64)> = None;
        rasterize(&font, text, x, y, size, |px, py, _| {
            let b = bounds.get_or_insert((px, py, px, py));
            *b = (b.0.min(px), b.1.min(py), b.2.max(px), b.3.max(py));
        });
        bounds
    }

    #[test]
    fn test_embedded_font_loads() {
        assert!(label_font().is_ok());
    }

    #[test]
    fn test_font_is_monospace() {
        let font = label_font().unwrap();
        let narrow = text_width(&font, "iii", 16.0);
        let wide = text_width(&font, "WWW", 16.0);
        assert!((narrow - wide).abs() < 1e-3);
        assert!(narrow > 0.0);
    }

    #[test]
    fn test_width_scales_with_size() {
        let font = label_font().unwrap();
        let small = text_width(&font, "PROTOTYPE", 8.0);
        let large = text_width(&font, "PROTOTYPE", 16.0);
        assert!((large - 2.0 * small).abs() < 1e-2);
    }

    #[test]
    fn test_space_draws_nothing() {
        assert!(extent("   ", 10.0, 10.0, 16.0).is_none());
    }

    #[test]
    fn test_glyphs_stay_inside_the_line() {
        let font = label_font().unwrap();
        let width = text_width(&font, "PROTOTYPE", 16.0);
        let (x0, y0, x1, y1) = extent("PROTOTYPE", 8.0, 8.0, 16.0).unwrap();

        assert!(x0 >= 8 && (x1 as f32) <= 8.0 + width + 1.0);
        // Capitals sit below the em box top and above the next line
        assert!(y0 >= 8 && y1 < 8 + 16);
    }

    #[test]
    fn test_top_baseline_offsets_follow_y() {
        let a = extent("A", 0.0, 0.0, 16.0).unwrap();
        let b = extent("A", 0.0, 16.0, 16.0).unwrap();
        assert_eq!(b.1 - a.1, 16);
        assert_eq!(b.3 - a.3, 16);
    }
}
