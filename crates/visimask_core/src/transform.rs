//! Transform (position, rotation, scale)

use serde::{Deserialize, Serialize};
use visimask_math::{mat4, Mat4, Vec3};

/// Position, Euler rotation in radians, and per-axis scale
///
/// Rotation is applied Z first, then X, then Y.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub const fn identity() -> Self {
        Self { position: Vec3::ZERO, rotation: Vec3::ZERO, scale: Vec3::ONE }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::identity() }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vec3::splat(scale))
    }

    /// Local-to-world matrix
    pub fn matrix(&self) -> Mat4 {
        mat4::from_trs(self.position, self.rotation, self.scale)
    }

    /// Matrix for transforming normals into world space
    pub fn normal_matrix(&self) -> Mat4 {
        mat4::normal_matrix(&self.matrix())
    }

    /// Transform a point from local space to world space
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        mat4::transform_point(&self.matrix(), p).xyz()
    }

    pub fn is_rotated(&self) -> bool {
        self.rotation != Vec3::ZERO
    }
}
