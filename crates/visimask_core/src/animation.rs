//! Time-driven motion
//!
//! Everything here is a pure function of elapsed seconds so a frame can be
//! reproduced from its timestamp alone.

use serde::{Deserialize, Serialize};
use visimask_math::Vec3;

use crate::transform::Transform;

/// Circular path in the XZ plane at a fixed height
///
/// Position at time `t` is `center + (r cos ωt, h, r sin ωt)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitPath {
    pub radius: f32,
    pub height: f32,
    /// Radians per second
    pub angular_speed: f32,
    /// Center of the circle; also the point the orbiting camera looks at
    pub center: Vec3,
}

impl Default for OrbitPath {
    fn default() -> Self {
        Self { radius: 10.0, height: 5.0, angular_speed: 0.1, center: Vec3::ZERO }
    }
}

/// Eye and look-at point on an orbit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitPose {
    pub eye: Vec3,
    pub target: Vec3,
}

impl OrbitPath {
    pub fn new(radius: f32, height: f32, angular_speed: f32) -> Self {
        Self { radius, height, angular_speed, center: Vec3::ZERO }
    }

    pub fn with_center(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    pub fn position_at(&self, t: f32) -> Vec3 {
        let angle = self.angular_speed * t;
        self.center + Vec3::new(self.radius * angle.cos(), self.height, self.radius * angle.sin())
    }

    /// Pose at time `t`, looking back at the center
    pub fn pose_at(&self, t: f32) -> OrbitPose {
        OrbitPose { eye: self.position_at(t), target: self.center }
    }
}

/// Per-entity animation evaluated against the entity's rest transform
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Animation {
    /// Constant angular velocity (radians per second per Euler axis)
    Spin { rate: Vec3 },
    /// Circle around the rest position's vertical axis: x = r sin θ, z = r cos θ
    Satellite {
        radius: f32,
        /// Radians per second
        speed: f32,
        #[serde(default)]
        phase: f32,
    },
}

impl Animation {
    /// Transform at time `t` for an entity whose un-animated transform is `rest`
    pub fn evaluate(&self, rest: &Transform, t: f32) -> Transform {
        match *self {
            Animation::Spin { rate } => Transform { rotation: rest.rotation + rate * t, ..*rest },
            Animation::Satellite { radius, speed, phase } => {
                let angle = speed * t + phase;
                let offset = Vec3::new(angle.sin() * radius, 0.0, angle.cos() * radius);
                Transform { position: rest.position + offset, ..*rest }
            }
        }
    }
}
