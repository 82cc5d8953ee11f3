//! Prototype checkerboard texture
//!
//! A square canvas of alternating colors with a border, a center crosshair
//! and three debug labels. The labels give the scale of one tile and the
//! canvas resolution, which makes texture placement easy to check by eye.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::TextureError;
use crate::raster::{parse_hex_color, Canvas};

/// Checkerboard generator settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerboardConfig {
    /// Width and height of the square canvas in pixels
    pub canvas_width: u32,
    /// Squares per row and per column
    pub squares: u32,
    /// Color of squares where `(x + y)` is even
    pub color1: String,
    /// Color of the other squares
    pub color2: String,
    /// Border, crosshair and label color
    pub border_color: String,
    /// Draw the debug labels
    pub labels: bool,
}

impl Default for CheckerboardConfig {
    fn default() -> Self {
        Self {
            canvas_width: 256,
            squares: 32,
            color1: "#0000ff".to_string(),
            color2: "#2222ff".to_string(),
            border_color: "#ffffff".to_string(),
            labels: true,
        }
    }
}

impl CheckerboardConfig {
    /// Font size of the labels; the border and crosshair derive from it
    pub fn font_size(&self) -> u32 {
        self.canvas_width / 16
    }

    /// Border and crosshair width in pixels
    pub fn line_width(&self) -> u32 {
        self.font_size() / 4
    }
}

/// Render the checkerboard
pub fn generate_checkerboard(config: &CheckerboardConfig) -> Result<RgbaImage, TextureError> {
    let width = config.canvas_width;
    if config.squares == 0 || config.squares > width {
        return Err(TextureError::InvalidSquareCount(config.squares));
    }
    let color1 = parse_hex_color(&config.color1)?;
    let color2 = parse_hex_color(&config.color2)?;
    let border = parse_hex_color(&config.border_color)?;

    let mut canvas = Canvas::new(width, width)?;
    let w = width as f32;
    let size = w / config.squares as f32;

    for y in 0..config.squares {
        for x in 0..config.squares {
            let color = if (x + y) % 2 == 0 { color1 } else { color2 };
            canvas.fill_rect(x as f32 * size, y as f32 * size, size, size, color);
        }
    }

    let font_size = config.font_size();
    let line_width = config.line_width() as f32;
    if line_width > 0.0 {
        canvas.stroke_rect(line_width / 2.0, line_width / 2.0, w - line_width, w - line_width, line_width, border);
        canvas.hline(w / 2.0, 0.0, w, line_width, border);
        canvas.vline(w / 2.0, 0.0, w, line_width, border);
    }

    if config.labels && font_size > 0 {
        let fs = font_size as f32;
        let labels = [
            "PROTOTYPE".to_string(),
            "1 x 1 meter".to_string(),
            format!("{} x {}", width, width),
        ];
        for (k, label) in labels.iter().enumerate() {
            canvas.fill_text(label, fs / 2.0, fs / 2.0 + fs * k as f32, fs, border)?;
        }
    }

    log::debug!("Generated {}x{} checkerboard with {} squares", width, width, config.squares);
    Ok(canvas.into_image())
}
