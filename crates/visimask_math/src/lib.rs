//! Mathematics for the visimask demos
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector (world positions, directions, colors)
//! - [`Vec4`] - homogeneous 4D vector (clip-space positions)
//! - [`Mat4`] - column-major 4x4 matrix, laid out the way WGSL expects it
//!
//! Matrix helpers follow the OpenGL clip convention (NDC z in [-1, 1]) because
//! the masking math is defined in terms of it.

mod vec3;
mod vec4;
pub mod mat4;

pub use vec3::Vec3;
pub use vec4::Vec4;
pub use mat4::Mat4;
