//! Procedural textures
//!
//! - [`Canvas`] - a minimal pixel-aligned 2D raster with rectangle and text drawing
//! - [`label_font`] - the embedded monospace font used for labels
//! - [`generate_checkerboard`] - the prototype checkerboard used on ground and obstacles
//! - [`prepare_for_upload`] - optional blur and vertical flip before GPU upload

mod checkerboard;
mod error;
mod font;
mod prepare;
mod raster;

pub use checkerboard::{generate_checkerboard, CheckerboardConfig};
pub use error::TextureError;
pub use font::{label_font, text_width};
pub use prepare::{prepare_for_upload, PreparedTexture, UploadOptions};
pub use raster::{parse_hex_color, Canvas};

pub use image::{Rgba, RgbaImage};
