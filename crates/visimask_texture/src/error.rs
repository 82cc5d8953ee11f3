//! Texture error types

use std::fmt;

/// Error type for texture generation
#[derive(Debug)]
pub enum TextureError {
    /// Width or height is zero
    InvalidSize { width: u32, height: u32 },
    /// Checkerboard with zero squares, or more squares than pixels
    InvalidSquareCount(u32),
    /// Color string is not `#rgb` or `#rrggbb`
    InvalidColor(String),
    /// The embedded label font could not be parsed
    Font(String),
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::InvalidSize { width, height } => {
                write!(f, "Invalid texture size {}x{}", width, height)
            }
            TextureError::InvalidSquareCount(n) => write!(f, "Invalid checkerboard square count: {}", n),
            TextureError::InvalidColor(s) => write!(f, "Invalid color '{}': expected #rgb or #rrggbb", s),
            TextureError::Font(msg) => write!(f, "Label font error: {}", msg),
        }
    }
}

impl std::error::Error for TextureError {}
