//! Planar movement from a key snapshot
//!
//! Forward is +Z and right is +X. Diagonals are normalized so moving at an
//! angle is no faster than moving straight.

use visimask_math::Vec3;

use crate::key_state::InputSnapshot;

/// Unit direction in the XZ plane, or zero when no net direction is pressed
pub fn planar_direction(snapshot: &InputSnapshot) -> Vec3 {
    let (forward, right) = snapshot.axes();
    Vec3::new(right, 0.0, forward).normalized()
}

/// Walking speed in world units per second
pub const DEFAULT_MOVE_SPEED: f32 = 5.0;

/// Turns key snapshots into per-frame position deltas
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementIntegrator {
    /// World units per second
    pub speed: f32,
}

impl Default for MovementIntegrator {
    fn default() -> Self {
        Self { speed: DEFAULT_MOVE_SPEED }
    }
}

impl MovementIntegrator {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    /// Displacement for one frame of length `dt` seconds
    pub fn delta(&self, snapshot: &InputSnapshot, dt: f32) -> Vec3 {
        planar_direction(snapshot) * (self.speed * dt)
    }
}
