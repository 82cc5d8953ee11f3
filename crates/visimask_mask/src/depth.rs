//! Depth buffer sampling
//!
//! The frustum mask reads stored depth from a buffer rendered from the
//! secondary camera. On the GPU that is a texture; on the CPU it is a
//! [`DepthBuffer`]. Both store `ndc.z * 0.5 + 0.5` with 1.0 meaning "nothing
//! rendered here".

/// Depth value of a cleared buffer
pub const FAR_DEPTH: f32 = 1.0;

/// Anything that can return a stored depth for a texture coordinate
///
/// Texture coordinates have their origin at the bottom-left, the way
/// `ndc.xy * 0.5 + 0.5` produces them. Out-of-range coordinates must be
/// clamped to the edge.
pub trait DepthSampler {
    fn sample(&self, uv: [f32; 2]) -> f32;
}

/// A single depth value everywhere
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantDepth(pub f32);

impl DepthSampler for ConstantDepth {
    fn sample(&self, _uv: [f32; 2]) -> f32 {
        self.0
    }
}

/// CPU depth buffer
///
/// Rows are stored top-down (row 0 is the top of the image, as a GPU readback
/// returns them). Sampling is nearest-texel with clamp-to-edge addressing.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl DepthBuffer {
    /// Create a buffer cleared to [`FAR_DEPTH`]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, FAR_DEPTH)
    }

    /// Create a buffer with every texel set to `depth`
    pub fn filled(width: u32, height: u32, depth: f32) -> Self {
        Self {
            width,
            height,
            data: vec![depth; (width as usize) * (height as usize)],
        }
    }

    /// Create a buffer from a function of texel coordinates (x right, y down)
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> f32) -> Self {
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Wrap raw top-down texel data, e.g. from a GPU readback
    ///
    /// Returns `None` when `data` does not hold exactly `width * height` texels.
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Option<Self> {
        if data.len() == (width as usize) * (height as usize) {
            Some(Self { width, height, data })
        } else {
            None
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texel value, or `None` outside the buffer
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.data[self.index(x, y)])
        } else {
            None
        }
    }

    /// Overwrite a texel; out-of-range writes are ignored
    pub fn set(&mut self, x: u32, y: u32, depth: f32) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.data[i] = depth;
        }
    }

    /// Keep the nearer of the stored and incoming depth (a `Less` depth test)
    pub fn write_nearest(&mut self, x: u32, y: u32, depth: f32) {
        if let Some(stored) = self.get(x, y) {
            if depth < stored {
                self.set(x, y, depth);
            }
        }
    }

    /// Reset every texel to [`FAR_DEPTH`]
    pub fn clear(&mut self) {
        self.data.fill(FAR_DEPTH);
    }

    /// Texel coordinates for a bottom-left-origin uv, clamped to the edge
    pub fn texel_for_uv(&self, uv: [f32; 2]) -> (u32, u32) {
        let clamp_axis = |t: f32, size: u32| -> u32 {
            if size == 0 {
                return 0;
            }
            let scaled = (t * size as f32).floor();
            if scaled.is_nan() || scaled < 0.0 {
                0
            } else {
                (scaled as u32).min(size - 1)
            }
        };
        (clamp_axis(uv[0], self.width), clamp_axis(1.0 - uv[1], self.height))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

impl DepthSampler for DepthBuffer {
    fn sample(&self, uv: [f32; 2]) -> f32 {
        if self.data.is_empty() {
            return FAR_DEPTH;
        }
        let (x, y) = self.texel_for_uv(uv);
        self.data[self.index(x, y)]
    }
}
