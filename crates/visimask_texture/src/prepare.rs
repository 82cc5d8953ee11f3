//! Raster post-processing before GPU upload

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

/// Upload options for a raster texture
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadOptions {
    /// Debug label of the GPU texture
    pub name: String,
    /// Flip rows so the raster's top row maps to v = 1 (bottom-left uv origin)
    pub invert_y: bool,
    /// Apply a gaussian blur first
    pub blur: bool,
    /// Blur standard deviation in pixels
    pub blur_amount: f32,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            name: "Raw texture".to_string(),
            invert_y: true,
            blur: false,
            blur_amount: 4.0,
        }
    }
}

impl UploadOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_blur(mut self, amount: f32) -> Self {
        self.blur = true;
        self.blur_amount = amount;
        self
    }

    pub fn with_invert_y(mut self, invert_y: bool) -> Self {
        self.invert_y = invert_y;
        self
    }
}

/// Tightly packed RGBA8 pixels in upload row order
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PreparedTexture {
    /// Bytes per row of `pixels`
    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

/// Apply blur and row flip as requested by `options`
pub fn prepare_for_upload(image: &RgbaImage, options: &UploadOptions) -> PreparedTexture {
    let mut out = if options.blur && options.blur_amount > 0.0 {
        imageops::blur(image, options.blur_amount)
    } else {
        image.clone()
    };

    if options.invert_y {
        imageops::flip_vertical_in_place(&mut out);
    }

    PreparedTexture {
        name: options.name.clone(),
        width: out.width(),
        height: out.height(),
        pixels: out.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn two_rows() -> RgbaImage {
        // Top row red, bottom row green
        RgbaImage::from_fn(2, 2, |_, y| {
            if y == 0 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 255, 0, 255]) }
        })
    }

    #[test]
    fn test_defaults() {
        let opts = UploadOptions::default();
        assert_eq!(opts.name, "Raw texture");
        assert!(opts.invert_y);
        assert!(!opts.blur);
        assert_eq!(opts.blur_amount, 4.0);
    }

    #[test]
    fn test_invert_y_flips_rows() {
        let prepared = prepare_for_upload(&two_rows(), &UploadOptions::default());
        assert_eq!(&prepared.pixels[0..4], &[0, 255, 0, 255]);
        assert_eq!(&prepared.pixels[8..12], &[255, 0, 0, 255]);
        assert_eq!(prepared.bytes_per_row(), 8);
    }

    #[test]
    fn test_no_flip_keeps_rows() {
        let opts = UploadOptions::default().with_invert_y(false);
        let prepared = prepare_for_upload(&two_rows(), &opts);
        assert_eq!(&prepared.pixels[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_blur_mixes_neighbours() {
        let img = RgbaImage::from_fn(9, 9, |x, _| {
            if x < 4 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) }
        });
        let opts = UploadOptions::named("blurred").with_blur(2.0).with_invert_y(false);
        let prepared = prepare_for_upload(&img, &opts);
        let edge = prepared.pixels[(4 * 9 + 4) * 4];
        assert!(edge > 0 && edge < 255, "edge pixel {}", edge);
        assert_eq!(prepared.name, "blurred");
        assert_eq!((prepared.width, prepared.height), (9, 9));
    }

    #[test]
    fn test_zero_blur_amount_is_noop() {
        let img = two_rows();
        let opts = UploadOptions::default().with_blur(0.0).with_invert_y(false);
        assert_eq!(prepare_for_upload(&img, &opts).pixels, img.into_raw());
    }
}
