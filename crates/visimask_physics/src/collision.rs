//! Contact generation
//!
//! Contacts carry a normal pointing from the static shape toward the moving
//! one, so pushing the mover by `normal * penetration` separates the two.

use bitflags::bitflags;
use visimask_math::Vec3;

use crate::shapes::{Aabb, Capsule};

bitflags! {
    /// Collision layers for filtering which colliders a mover reacts to
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CollisionLayer: u32 {
        /// Default layer for most objects
        const DEFAULT = 1 << 0;
        /// Player character layer
        const PLAYER = 1 << 1;
        /// Static world geometry (floors, walls)
        const STATIC = 1 << 2;
        /// Geometry the player may walk through (sky sphere, decorations)
        const DECORATION = 1 << 3;
        /// All layers
        const ALL = 0xFFFFFFFF;
    }
}

/// Contact information from a collision
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Closest point on the static shape
    pub point: Vec3,
    /// Unit normal from the static shape toward the mover
    pub normal: Vec3,
    /// Penetration depth (positive means overlapping)
    pub penetration: f32,
}

impl Contact {
    pub fn new(point: Vec3, normal: Vec3, penetration: f32) -> Self {
        Self { point, normal, penetration }
    }

    /// Displacement that resolves this contact
    pub fn correction(&self) -> Vec3 {
        self.normal * self.penetration
    }
}

/// Test sphere vs AABB collision
///
/// Returns a contact if the sphere overlaps the box; touching is not a contact.
pub fn sphere_vs_aabb(center: Vec3, radius: f32, aabb: &Aabb) -> Option<Contact> {
    let closest = aabb.closest_point(center);
    let delta = center - closest;
    let dist_squared = delta.length_squared();

    if dist_squared >= radius * radius {
        return None;
    }

    let dist = dist_squared.sqrt();
    if dist > 0.0001 {
        return Some(Contact::new(closest, delta * (1.0 / dist), radius - dist));
    }

    // Center is inside the box: leave through the nearest face
    let to_min = center - aabb.min;
    let to_max = aabb.max - center;
    let candidates = [
        (to_min.x, Vec3::new(-1.0, 0.0, 0.0)),
        (to_max.x, Vec3::X),
        (to_min.y, Vec3::new(0.0, -1.0, 0.0)),
        (to_max.y, Vec3::Y),
        (to_min.z, Vec3::new(0.0, 0.0, -1.0)),
        (to_max.z, Vec3::Z),
    ];
    let mut best = candidates[0];
    for c in &candidates[1..] {
        if c.0 < best.0 {
            best = *c;
        }
    }
    Some(Contact::new(closest, best.1, radius + best.0))
}

/// Test vertical capsule vs AABB collision
///
/// The capsule reduces to the sphere at the segment point nearest the box.
/// For a vertical segment that is the capsule center clamped into the
/// overlap of the segment's and the box's height ranges.
pub fn capsule_vs_aabb(capsule: &Capsule, aabb: &Aabb) -> Option<Contact> {
    let (bottom, top) = capsule.segment();
    let lo = bottom.y.max(aabb.min.y);
    let hi = top.y.min(aabb.max.y);

    let y = if lo <= hi {
        capsule.center.y.clamp(lo, hi)
    } else if bottom.y > aabb.max.y {
        bottom.y
    } else {
        top.y
    };

    sphere_vs_aabb(capsule.center.with_y(y), capsule.radius, aabb)
}
