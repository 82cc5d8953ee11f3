//! Move-and-slide for the player capsule
//!
//! The desired displacement is split into sub-steps no longer than half the
//! capsule radius so a fast frame cannot tunnel through thin walls. After each
//! sub-step every overlapping collider pushes the capsule out along its
//! contact normal. Only the into-wall component is undone, which leaves the
//! motion along the face intact and produces sliding.

use visimask_math::Vec3;

use crate::collision::CollisionLayer;
use crate::shapes::Capsule;
use crate::world::CollisionWorld;

/// Default number of push-out passes per sub-step
pub const DEFAULT_MAX_ITERATIONS: u32 = 4;

/// Upper bound on sub-steps for a single move
const MAX_SUBSTEPS: u32 = 256;

/// Outcome of one `move_and_slide` call
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveResult {
    /// Displacement actually applied to the capsule
    pub applied: Vec3,
    /// Whether any collider was touched along the way
    pub collided: bool,
}

/// Kinematic capsule moved by input and stopped by static colliders
#[derive(Clone, Debug)]
pub struct CharacterController {
    capsule: Capsule,
    /// Push-out passes per sub-step
    pub max_iterations: u32,
    /// Extra separation added to every push-out
    pub skin: f32,
    /// Layers the capsule collides with
    pub mask: CollisionLayer,
}

impl CharacterController {
    pub fn new(capsule: Capsule) -> Self {
        Self {
            capsule,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            skin: 0.0,
            mask: CollisionLayer::STATIC | CollisionLayer::DEFAULT,
        }
    }

    pub fn with_max_iterations(mut self, iterations: u32) -> Self {
        self.max_iterations = iterations.max(1);
        self
    }

    pub fn with_skin(mut self, skin: f32) -> Self {
        self.skin = skin.max(0.0);
        self
    }

    pub fn with_mask(mut self, mask: CollisionLayer) -> Self {
        self.mask = mask;
        self
    }

    pub fn capsule(&self) -> &Capsule {
        &self.capsule
    }

    pub fn position(&self) -> Vec3 {
        self.capsule.center
    }

    /// Teleport without collision
    pub fn set_position(&mut self, position: Vec3) {
        self.capsule.center = position;
    }

    /// Move by `delta`, sliding along anything in the way
    pub fn move_and_slide(&mut self, world: &CollisionWorld, delta: Vec3) -> MoveResult {
        let start = self.capsule.center;
        let mut collided = false;

        let length = delta.length();
        if !length.is_finite() {
            log::warn!("Ignoring non-finite movement {:?}", delta);
            return MoveResult { applied: Vec3::ZERO, collided };
        }

        let max_step = (self.capsule.radius * 0.5).max(1e-3);
        let steps = ((length / max_step).ceil() as u32).clamp(1, MAX_SUBSTEPS);
        let step = delta / steps as f32;

        for _ in 0..steps {
            self.capsule.center += step;
            collided |= self.resolve(world);
        }

        // Also resolve when the move was zero, e.g. after spawning inside a collider
        if length == 0.0 {
            collided |= self.resolve(world);
        }

        MoveResult { applied: self.capsule.center - start, collided }
    }

    fn resolve(&mut self, world: &CollisionWorld) -> bool {
        let mut touched = false;
        for _ in 0..self.max_iterations {
            let contacts = world.capsule_contacts(&self.capsule, self.mask);
            if contacts.is_empty() {
                break;
            }
            touched = true;
            for (_, contact) in contacts {
                self.capsule.center += contact.normal * (contact.penetration + self.skin);
            }
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Aabb;
    use crate::world::StaticCollider;

    const EPSILON: f32 = 1e-3;

    fn player_at(x: f32, z: f32) -> CharacterController {
        // Bottom of the capsule rests on y = 0
        CharacterController::new(Capsule::new(Vec3::new(x, 1.0, z), 0.5, 0.5))
    }

    fn wall_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add(StaticCollider::new(Aabb::new(
            Vec3::new(2.0, 0.0, -10.0),
            Vec3::new(3.0, 2.0, 10.0),
        )));
        world
    }

    #[test]
    fn test_free_move_is_unchanged() {
        let world = wall_world();
        let mut player = player_at(0.0, 0.0);
        let result = player.move_and_slide(&world, Vec3::new(-1.0, 0.0, 2.0));
        assert!(!result.collided);
        assert!((result.applied - Vec3::new(-1.0, 0.0, 2.0)).length() < EPSILON);
    }

    #[test]
    fn test_wall_stops_motion_into_it() {
        let world = wall_world();
        let mut player = player_at(0.0, 0.0);
        let result = player.move_and_slide(&world, Vec3::new(5.0, 0.0, 0.0));
        assert!(result.collided);
        assert!((player.position().x - 1.5).abs() < EPSILON);
    }

    #[test]
    fn test_diagonal_into_wall_slides_along_face() {
        let world = wall_world();
        let mut player = player_at(0.0, 0.0);
        let result = player.move_and_slide(&world, Vec3::new(3.0, 0.0, 1.0));
        assert!(result.collided);
        assert!((result.applied.x - 1.5).abs() < EPSILON);
        assert!((result.applied.z - 1.0).abs() < EPSILON);
        assert!(result.applied.y.abs() < EPSILON);
    }

    #[test]
    fn test_resting_on_ground_is_not_a_collision() {
        let mut world = CollisionWorld::new();
        world.add(StaticCollider::new(Aabb::new(
            Vec3::new(-50.0, -1.0, -50.0),
            Vec3::new(50.0, 0.0, 50.0),
        )));
        let mut player = player_at(0.0, 0.0);
        let result = player.move_and_slide(&world, Vec3::new(0.0, 0.0, 3.0));
        assert!(!result.collided);
        assert!((player.position().y - 1.0).abs() < EPSILON);
        assert!((player.position().z - 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_spawn_inside_is_pushed_out() {
        let mut world = CollisionWorld::new();
        world.add(StaticCollider::new(Aabb::new(
            Vec3::new(-50.0, -1.0, -50.0),
            Vec3::new(50.0, 0.0, 50.0),
        )));
        let mut player = CharacterController::new(Capsule::new(Vec3::new(0.0, 0.8, 0.0), 0.5, 0.5));
        let result = player.move_and_slide(&world, Vec3::ZERO);
        assert!(result.collided);
        assert!((player.position().y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_corner_stops_both_axes() {
        let mut world = wall_world();
        world.add(StaticCollider::new(Aabb::new(
            Vec3::new(-10.0, 0.0, 2.0),
            Vec3::new(10.0, 2.0, 3.0),
        )));
        let mut player = player_at(0.0, 0.0);
        player.move_and_slide(&world, Vec3::new(4.0, 0.0, 4.0));
        assert!((player.position().x - 1.5).abs() < EPSILON);
        assert!((player.position().z - 1.5).abs() < EPSILON);
    }

    #[test]
    fn test_masked_out_layer_is_ignored() {
        let mut world = CollisionWorld::new();
        world.add(
            StaticCollider::new(Aabb::new(Vec3::new(2.0, 0.0, -10.0), Vec3::new(3.0, 2.0, 10.0)))
                .with_layer(CollisionLayer::DECORATION),
        );
        let mut player = player_at(0.0, 0.0);
        let result = player.move_and_slide(&world, Vec3::new(5.0, 0.0, 0.0));
        assert!(!result.collided);
        assert!((player.position().x - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_non_finite_delta_is_ignored() {
        let world = wall_world();
        let mut player = player_at(0.0, 0.0);
        let result = player.move_and_slide(&world, Vec3::new(f32::NAN, 0.0, 0.0));
        assert_eq!(result.applied, Vec3::ZERO);
        assert_eq!(player.position(), Vec3::new(0.0, 1.0, 0.0));
    }
}
