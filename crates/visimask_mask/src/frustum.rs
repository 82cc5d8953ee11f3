//! Frustum and occlusion test against a secondary camera
//!
//! A fragment is visible from the secondary camera when its projected position
//! lies inside that camera's frustum and no nearer surface was recorded in the
//! camera's depth buffer:
//!
//! 1. `clip = view_proj * world * (p, 1)`
//! 2. `ndc = clip.xyz / clip.w`
//! 3. outside when `|ndc.x| > 1`, `|ndc.y| > 1` or `ndc.z < 0` (no depth read)
//! 4. `uv = ndc.xy * 0.5 + 0.5`, `stored = depth(uv)`
//! 5. `current = ndc.z * 0.5 + 0.5`
//! 6. occluded when `current - bias > stored`
//!
//! The same steps are injected into WGSL by
//! [`FrustumMaskPlugin`](crate::FrustumMaskPlugin).

use visimask_math::{mat4, Mat4, Vec3, Vec4};

use crate::depth::DepthSampler;

/// Depth comparison bias that hides self-occlusion acne
pub const DEFAULT_DEPTH_BIAS: f32 = 0.0001;

/// Smallest clip.w that is divided by; points at or behind the eye count as outside
pub const MIN_CLIP_W: f32 = 1e-6;

/// Result of the visibility test for one fragment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Inside the secondary frustum and not occluded
    Visible,
    /// Outside the secondary frustum (including at or behind the eye)
    OutsideFrustum,
    /// Inside the frustum but behind a nearer surface
    Occluded,
}

impl Visibility {
    #[inline]
    pub fn is_visible(self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

/// Perspective divide, or `None` when the point is at or behind the eye
#[inline]
pub fn perspective_divide(clip: Vec4) -> Option<Vec3> {
    if clip.w < MIN_CLIP_W || !clip.w.is_finite() {
        None
    } else {
        Some(clip.xyz() / clip.w)
    }
}

/// Whether an NDC position passes the frustum test
#[inline]
pub fn in_frustum(ndc: Vec3) -> bool {
    !(ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || ndc.z < 0.0)
}

/// Map NDC xy from [-1, 1] to texture space [0, 1]
#[inline]
pub fn ndc_to_uv(ndc: Vec3) -> [f32; 2] {
    [ndc.x * 0.5 + 0.5, ndc.y * 0.5 + 0.5]
}

/// Map NDC z from [-1, 1] to the stored depth range [0, 1]
#[inline]
pub fn ndc_to_depth(z: f32) -> f32 {
    z * 0.5 + 0.5
}

/// Biased depth comparison
#[inline]
pub fn is_occluded(current_depth: f32, stored_depth: f32, bias: f32) -> bool {
    current_depth - bias > stored_depth
}

/// Classify a world-space position
pub fn evaluate_world(
    world_position: Vec3,
    view_projection: &Mat4,
    depth: &impl DepthSampler,
    bias: f32,
) -> Visibility {
    let clip = mat4::transform_point(view_projection, world_position);
    evaluate_clip(clip, depth, bias)
}

/// Classify a mesh-local position under the mesh's world matrix
pub fn evaluate(
    local_position: Vec3,
    world: &Mat4,
    view_projection: &Mat4,
    depth: &impl DepthSampler,
    bias: f32,
) -> Visibility {
    let clip = mat4::transform(view_projection, mat4::transform_point(world, local_position));
    evaluate_clip(clip, depth, bias)
}

/// Classify an already-projected clip-space position
pub fn evaluate_clip(clip: Vec4, depth: &impl DepthSampler, bias: f32) -> Visibility {
    let Some(ndc) = perspective_divide(clip) else {
        return Visibility::OutsideFrustum;
    };

    if !in_frustum(ndc) {
        return Visibility::OutsideFrustum;
    }

    let stored = depth.sample(ndc_to_uv(ndc));
    if is_occluded(ndc_to_depth(ndc.z), stored, bias) {
        Visibility::Occluded
    } else {
        Visibility::Visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::{ConstantDepth, DepthBuffer, FAR_DEPTH};
    use std::cell::Cell;

    /// Depth sampler that records whether it was read
    struct SpySampler {
        value: f32,
        reads: Cell<u32>,
    }

    impl DepthSampler for SpySampler {
        fn sample(&self, _uv: [f32; 2]) -> f32 {
            self.reads.set(self.reads.get() + 1);
            self.value
        }
    }

    fn secondary_view_projection() -> Mat4 {
        let view = mat4::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let proj = mat4::perspective(60f32.to_radians(), 1.0, 0.1, 100.0);
        mat4::mul(proj, view)
    }

    #[test]
    fn test_visible_when_nothing_in_front() {
        let vp = secondary_view_projection();
        let result = evaluate_world(Vec3::ZERO, &vp, &ConstantDepth(FAR_DEPTH), DEFAULT_DEPTH_BIAS);
        assert_eq!(result, Visibility::Visible);
    }

    #[test]
    fn test_occluded_when_nearer_surface_stored() {
        let vp = secondary_view_projection();
        let result = evaluate_world(Vec3::ZERO, &vp, &ConstantDepth(0.5), DEFAULT_DEPTH_BIAS);
        assert_eq!(result, Visibility::Occluded);
    }

    #[test]
    fn test_outside_frustum_skips_depth_read() {
        let vp = secondary_view_projection();
        let spy = SpySampler { value: 0.0, reads: Cell::new(0) };
        // Far off to the side
        let result = evaluate_world(Vec3::new(100.0, 0.0, 0.0), &vp, &spy, DEFAULT_DEPTH_BIAS);
        assert_eq!(result, Visibility::OutsideFrustum);
        assert_eq!(spy.reads.get(), 0);
    }

    #[test]
    fn test_behind_camera_is_outside() {
        let vp = secondary_view_projection();
        let result = evaluate_world(Vec3::new(0.0, 0.0, 20.0), &vp, &ConstantDepth(FAR_DEPTH), 0.0);
        assert_eq!(result, Visibility::OutsideFrustum);
    }

    #[test]
    fn test_negative_ndc_z_is_outside() {
        let clip = Vec4::new(0.0, 0.0, -0.5, 1.0);
        assert_eq!(evaluate_clip(clip, &ConstantDepth(FAR_DEPTH), 0.0), Visibility::OutsideFrustum);
    }

    #[test]
    fn test_zero_w_is_outside() {
        let clip = Vec4::new(0.1, 0.1, 0.1, 0.0);
        assert_eq!(evaluate_clip(clip, &ConstantDepth(FAR_DEPTH), 0.0), Visibility::OutsideFrustum);
        assert!(perspective_divide(clip).is_none());
    }

    #[test]
    fn test_frustum_boundary_is_inside() {
        assert!(in_frustum(Vec3::new(1.0, -1.0, 0.0)));
        assert!(!in_frustum(Vec3::new(1.0001, 0.0, 0.5)));
        assert!(!in_frustum(Vec3::new(0.0, -1.0001, 0.5)));
    }

    #[test]
    fn test_bias_prevents_self_occlusion() {
        // Stored depth equals current depth up to a tiny error
        let clip = Vec4::new(0.0, 0.0, 0.6, 1.0);
        let current = ndc_to_depth(0.6);
        let stored = ConstantDepth(current - DEFAULT_DEPTH_BIAS * 0.5);
        assert_eq!(evaluate_clip(clip, &stored, DEFAULT_DEPTH_BIAS), Visibility::Visible);
        assert_eq!(evaluate_clip(clip, &stored, 0.0), Visibility::Occluded);
    }

    #[test]
    fn test_local_position_uses_world_matrix() {
        let vp = secondary_view_projection();
        // Mesh pushed far to the side; its local origin is outside
        let world = mat4::translation(Vec3::new(100.0, 0.0, 0.0));
        let depth = ConstantDepth(FAR_DEPTH);
        assert_eq!(evaluate(Vec3::ZERO, &world, &vp, &depth, 0.0), Visibility::OutsideFrustum);
        assert_eq!(evaluate(Vec3::ZERO, &mat4::IDENTITY, &vp, &depth, 0.0), Visibility::Visible);
    }

    #[test]
    fn test_depth_buffer_lookup_uses_projected_uv() {
        let vp = secondary_view_projection();
        // Left half of the buffer holds a near occluder
        let buf = DepthBuffer::from_fn(8, 8, |x, _| if x < 4 { 0.0 } else { FAR_DEPTH });
        let left = evaluate_world(Vec3::new(-2.0, 0.0, 0.0), &vp, &buf, DEFAULT_DEPTH_BIAS);
        let right = evaluate_world(Vec3::new(2.0, 0.0, 0.0), &vp, &buf, DEFAULT_DEPTH_BIAS);
        assert_eq!(left, Visibility::Occluded);
        assert_eq!(right, Visibility::Visible);
    }
}
