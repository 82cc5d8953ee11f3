//! Collision shapes

use serde::{Deserialize, Serialize};
use visimask_math::Vec3;

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create from corners; components are sorted so `min <= max`
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { min: a.min_components(b), max: a.max_components(b) }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let h = half_extents.abs();
        Self { min: center - h, max: center + h }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Closed containment test
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }

    /// Nearest point of the box to `p` (p itself when inside)
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.clamp_components(self.min, self.max)
    }

    pub fn translated(&self, delta: Vec3) -> Self {
        Self { min: self.min + delta, max: self.max + delta }
    }
}

/// Upright capsule: a vertical segment swept by a sphere
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub center: Vec3,
    /// Half length of the inner segment (total height is `2 * (half_height + radius)`)
    pub half_height: f32,
    pub radius: f32,
}

impl Capsule {
    pub fn new(center: Vec3, half_height: f32, radius: f32) -> Self {
        Self { center, half_height: half_height.max(0.0), radius: radius.max(0.0) }
    }

    /// Capsule of a given total height, like a character mesh
    pub fn from_height(center: Vec3, height: f32, radius: f32) -> Self {
        Self::new(center, (height * 0.5 - radius).max(0.0), radius)
    }

    pub fn height(&self) -> f32 {
        2.0 * (self.half_height + self.radius)
    }

    /// Segment endpoints (bottom, top)
    pub fn segment(&self) -> (Vec3, Vec3) {
        let h = Vec3::new(0.0, self.half_height, 0.0);
        (self.center - h, self.center + h)
    }

    /// Lowest point of the capsule
    pub fn bottom(&self) -> f32 {
        self.center.y - self.half_height - self.radius
    }

    pub fn translated(&self, delta: Vec3) -> Self {
        Self { center: self.center + delta, ..*self }
    }

    /// World-space bounds
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(
            self.center,
            Vec3::new(self.radius, self.half_height + self.radius, self.radius),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_new_sorts_corners() {
        let b = Aabb::new(Vec3::new(1.0, -1.0, 2.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(b.center(), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_closest_point() {
        let b = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        assert_eq!(b.closest_point(Vec3::new(5.0, 0.5, -5.0)), Vec3::new(1.0, 0.5, -1.0));
        assert_eq!(b.closest_point(Vec3::splat(0.5)), Vec3::splat(0.5));
        assert!(b.contains(Vec3::ONE));
    }

    #[test]
    fn test_capsule_from_height() {
        let c = Capsule::from_height(Vec3::new(0.0, 1.0, 0.0), 2.0, 0.5);
        assert_eq!(c.half_height, 0.5);
        assert_eq!(c.height(), 2.0);
        assert_eq!(c.bottom(), 0.0);
        let (lo, hi) = c.segment();
        assert_eq!(lo.y, 0.5);
        assert_eq!(hi.y, 1.5);
    }

    #[test]
    fn test_capsule_bounds() {
        let c = Capsule::new(Vec3::ZERO, 1.0, 0.5);
        let b = c.bounds();
        assert_eq!(b.min, Vec3::new(-0.5, -1.5, -0.5));
        assert_eq!(b.max, Vec3::new(0.5, 1.5, 0.5));
    }
}
