//! GPU-compatible uniform types
//!
//! These types match the WGSL structs in `shaders/` exactly. All of them
//! derive Pod and Zeroable for direct buffer writes.

use bytemuck::{Pod, Zeroable};
use visimask_core::{MaterialDesc, Transform};
use visimask_math::{mat4, Mat4, Vec3};

use crate::camera::CameraPose;

/// Default hemispheric light: straight up, 0.7 intensity
pub const DEFAULT_LIGHT_DIRECTION: [f32; 3] = [0.0, 1.0, 0.0];
pub const DEFAULT_LIGHT_INTENSITY: f32 = 0.7;

/// Per-frame uniforms shared by every draw of a pass
/// Layout: 96 bytes (must match `FrameUniforms` in base.wgsl and depth.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// View-projection already corrected to wgpu clip space (64 bytes)
    pub view_projection: Mat4,
    /// Eye position + light intensity (16 bytes)
    pub camera_position: [f32; 3],
    pub light_intensity: f32,
    /// Hemispheric light direction + padding (16 bytes)
    pub light_direction: [f32; 3],
    pub _padding: f32,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view_projection: mat4::IDENTITY,
            camera_position: [0.0; 3],
            light_intensity: DEFAULT_LIGHT_INTENSITY,
            light_direction: DEFAULT_LIGHT_DIRECTION,
            _padding: 0.0,
        }
    }
}

impl FrameUniforms {
    pub fn from_pose(pose: &CameraPose, aspect: f32) -> Self {
        Self {
            view_projection: pose.gpu_view_projection(aspect),
            camera_position: pose.eye.into(),
            ..Self::default()
        }
    }

    pub fn with_light(mut self, direction: Vec3, intensity: f32) -> Self {
        self.light_direction = direction.normalized().into();
        self.light_intensity = intensity;
        self
    }
}

/// Per-object uniforms
/// Layout: 160 bytes (must match `ObjectUniforms` in base.wgsl and depth.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: Mat4,
    pub normal_matrix: Mat4,
    /// Diffuse color + texture flag (1.0 samples the diffuse texture)
    pub diffuse: [f32; 3],
    pub use_texture: f32,
    /// Specular color + Blinn-Phong exponent
    pub specular: [f32; 3],
    pub specular_power: f32,
}

impl Default for ObjectUniforms {
    fn default() -> Self {
        Self {
            model: mat4::IDENTITY,
            normal_matrix: mat4::IDENTITY,
            diffuse: [1.0; 3],
            use_texture: 0.0,
            specular: [1.0; 3],
            specular_power: 32.0,
        }
    }
}

impl ObjectUniforms {
    pub fn new(transform: &Transform, material: &MaterialDesc) -> Self {
        let mut uniforms = Self::default();
        uniforms.set_transform(transform);
        uniforms.set_material(material);
        uniforms
    }

    pub fn set_transform(&mut self, transform: &Transform) {
        self.model = transform.matrix();
        self.normal_matrix = transform.normal_matrix();
    }

    pub fn set_material(&mut self, material: &MaterialDesc) {
        self.diffuse = material.diffuse;
        self.specular = material.specular;
        self.specular_power = material.specular_power;
        self.use_texture = if material.checkerboard { 1.0 } else { 0.0 };
    }
}

/// Posterize parameters
/// Layout: 16 bytes (must match `PostUniforms` in post.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PostUniforms {
    pub levels: f32,
    pub threshold: f32,
    pub _padding: [f32; 2],
}

impl PostUniforms {
    pub fn new(levels: f32, threshold: f32) -> Self {
        Self { levels, threshold, _padding: [0.0; 2] }
    }
}
