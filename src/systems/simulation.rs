//! Game simulation system
//!
//! Manages the per-frame simulation including:
//! - Delta time calculation
//! - Input → character controller movement
//! - Time-driven animation
//! - Secondary camera pose

use std::time::Instant;

use visimask_core::{CollisionWorld, EntityKey, Mat4, MaskKind, OrbitPath, SceneInstance, Vec3, World};
use visimask_input::{InputSnapshot, KeyBindings, KeyState, MovementIntegrator};
use visimask_physics::{Capsule, CharacterController};
use visimask_render::CameraPose;

use crate::config::{AppConfig, SecondaryCameraConfig};
use crate::scene::{PLAYER_HEIGHT, PLAYER_NAME, PLAYER_RADIUS};

/// Movement dt cap after stalls (first frame, window drag, focus loss)
pub const MAX_FRAME_TIME: f32 = 0.25;

/// The player entity and the controller moving it
pub struct Player {
    pub key: EntityKey,
    pub controller: CharacterController,
}

/// Live scene state the simulation advances
pub struct ActiveScene {
    pub name: String,
    pub world: World,
    pub collision: CollisionWorld,
    pub player: Option<Player>,
    pub secondary_orbit: OrbitPath,
    pub masks: Vec<MaskKind>,
    pub camera_position: Option<Vec3>,
    pub post_process: bool,
}

impl ActiveScene {
    /// Take over an instantiated scene, spawning the player controller
    ///
    /// `fallback_orbit` is used when the scene has no secondary orbit.
    pub fn new(instance: SceneInstance, fallback_orbit: OrbitPath) -> Self {
        let player = instance.world.key_by_name(PLAYER_NAME).map(|key| {
            let spawn = instance
                .player_spawn
                .or_else(|| instance.world.get_entity(key).map(|e| e.transform.position))
                .unwrap_or(Vec3::new(0.0, PLAYER_HEIGHT * 0.5, 0.0));
            log::info!("Player spawns at ({:.2}, {:.2}, {:.2})", spawn.x, spawn.y, spawn.z);
            Player {
                key,
                controller: CharacterController::new(Capsule::from_height(spawn, PLAYER_HEIGHT, PLAYER_RADIUS)),
            }
        });

        Self {
            name: instance.name,
            world: instance.world,
            collision: instance.collision,
            player,
            secondary_orbit: instance.secondary_orbit.unwrap_or(fallback_orbit),
            masks: instance.masks,
            camera_position: instance.camera_position,
            post_process: instance.post_process,
        }
    }

    pub fn uses_mask(&self, kind: MaskKind) -> bool {
        self.masks.contains(&kind)
    }

    pub fn player_position(&self) -> Option<Vec3> {
        self.player.as_ref().map(|p| p.controller.position())
    }
}

/// Everything later stages need from one simulation step
#[derive(Clone, Copy, Debug)]
pub struct FrameState {
    pub dt: f32,
    /// Seconds since the simulation started
    pub elapsed: f32,
    pub input: InputSnapshot,
    pub player_position: Option<Vec3>,
    /// Pose of the secondary camera this frame
    pub secondary_pose: CameraPose,
    /// OpenGL-convention view-projection of `secondary_pose`
    pub secondary_view_projection: Mat4,
    /// Aspect ratio `secondary_view_projection` was built for
    pub secondary_aspect: f32,
    /// Entities whose transform changed
    pub moved: usize,
    /// Whether the player touched a collider
    pub collided: bool,
}

impl FrameState {
    /// Rebuild the secondary view-projection for a depth target of `aspect`
    pub fn with_secondary_aspect(self, aspect: f32) -> Self {
        Self {
            secondary_view_projection: self.secondary_pose.view_projection(aspect),
            secondary_aspect: aspect,
            ..self
        }
    }
}

/// Manages the simulation loop
pub struct SimulationSystem {
    start: Instant,
    last_frame: Instant,
    elapsed: f32,
    integrator: MovementIntegrator,
    bindings: KeyBindings,
    secondary: SecondaryCameraConfig,
    secondary_aspect: f32,
}

impl SimulationSystem {
    /// Create a new simulation system
    pub fn new(config: &AppConfig) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed: 0.0,
            integrator: MovementIntegrator::new(config.input.move_speed),
            bindings: KeyBindings::default(),
            secondary: config.secondary.clone(),
            secondary_aspect: config.secondary.aspect_ratio(),
        }
    }

    /// Seconds of time driving animation and the orbit
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Restart the clock, e.g. after loading a scene
    pub fn reset_clock(&mut self) {
        self.start = Instant::now();
        self.last_frame = self.start;
        self.elapsed = 0.0;
    }

    /// Run one simulation frame using wall-clock time
    pub fn update(&mut self, scene: &mut ActiveScene, keys: &KeyState) -> FrameState {
        let now = Instant::now();
        let raw_dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        let elapsed = (now - self.start).as_secs_f32();
        self.advance(scene, keys.snapshot(&self.bindings), raw_dt, elapsed)
    }

    /// Advance by `dt` seconds with the given input
    pub fn step(&mut self, scene: &mut ActiveScene, input: InputSnapshot, dt: f32) -> FrameState {
        let elapsed = self.elapsed + dt.max(0.0);
        self.advance(scene, input, dt, elapsed)
    }

    fn advance(&mut self, scene: &mut ActiveScene, input: InputSnapshot, raw_dt: f32, elapsed: f32) -> FrameState {
        // Only movement is capped; animation and the orbit follow elapsed time
        let dt = raw_dt.clamp(0.0, MAX_FRAME_TIME);
        self.elapsed = elapsed;

        // 1. Player movement with collision sliding
        let mut collided = false;
        let mut player_moved = false;
        if let Some(player) = scene.player.as_mut() {
            let delta = self.integrator.delta(&input, dt);
            if delta != Vec3::ZERO {
                let result = player.controller.move_and_slide(&scene.collision, delta);
                collided = result.collided;
            }
            let position = player.controller.position();
            if let Some(entity) = scene.world.get_entity_mut(player.key) {
                if entity.transform.position != position {
                    entity.set_position(position);
                    player_moved = true;
                }
            }
        }

        // 2. Animation as a function of elapsed time
        let animated = scene.world.animate(self.elapsed);

        // 3. Secondary camera pose; the same pose feeds the depth pass
        let orbit = scene.secondary_orbit.pose_at(self.elapsed);
        let secondary_pose = CameraPose::new(
            orbit.eye,
            orbit.target,
            self.secondary.fov,
            self.secondary.near,
            self.secondary.far,
        );

        FrameState {
            dt,
            elapsed: self.elapsed,
            input,
            player_position: scene.player_position(),
            secondary_pose,
            secondary_view_projection: secondary_pose.view_projection(self.secondary_aspect),
            secondary_aspect: self.secondary_aspect,
            moved: animated + player_moved as usize,
            collided,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneBuilder;
    use visimask_core::MaterialDesc;

    const EPSILON: f32 = 1e-3;

    fn playground() -> (SimulationSystem, ActiveScene) {
        let config = AppConfig::default();
        let instance = SceneBuilder::playground().instantiate();
        let scene = ActiveScene::new(instance, OrbitPath::default());
        (SimulationSystem::new(&config), scene)
    }

    fn forward() -> InputSnapshot {
        InputSnapshot { forward: true, ..InputSnapshot::IDLE }
    }

    #[test]
    fn test_player_spawned_from_scene() {
        let (_, scene) = playground();
        let position = scene.player_position().unwrap();
        assert_eq!(position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_scene_without_player() {
        let instance = SceneBuilder::showcase().instantiate();
        let scene = ActiveScene::new(instance, OrbitPath::default());
        assert!(scene.player.is_none());
        assert!(scene.player_position().is_none());
    }

    #[test]
    fn test_dt_is_capped() {
        let (mut sim, mut scene) = playground();
        let state = sim.step(&mut scene, InputSnapshot::IDLE, 3.0);
        assert_eq!(state.dt, MAX_FRAME_TIME);
        assert_eq!(state.elapsed, 3.0);
        assert_eq!(sim.elapsed(), 3.0);
    }

    #[test]
    fn test_stall_caps_movement_only() {
        let (mut sim, mut scene) = playground();
        let state = sim.step(&mut scene, forward(), 2.0);
        // 5 units/s for the capped 0.25 s
        assert!((state.player_position.unwrap().z - 1.25).abs() < EPSILON);
    }

    #[test]
    fn test_orbit_follows_elapsed_time_after_stall() {
        let (mut sim, mut scene) = playground();
        let state = sim.step(&mut scene, InputSnapshot::IDLE, 2.0);
        let expected = scene.secondary_orbit.pose_at(2.0);
        assert!((state.secondary_pose.eye - expected.eye).length() < EPSILON);
    }

    #[test]
    fn test_one_long_frame_matches_many_short_ones() {
        let (mut long_sim, mut long_scene) = playground();
        let (mut short_sim, mut short_scene) = playground();

        let long = long_sim.step(&mut long_scene, InputSnapshot::IDLE, 2.0);
        let mut short = short_sim.step(&mut short_scene, InputSnapshot::IDLE, 0.25);
        for _ in 1..8 {
            short = short_sim.step(&mut short_scene, InputSnapshot::IDLE, 0.25);
        }

        assert!((long.secondary_pose.eye - short.secondary_pose.eye).length() < EPSILON);
        let orb = |scene: &ActiveScene| {
            let key = scene.world.key_by_name("orb").unwrap();
            scene.world.get_entity(key).unwrap().transform.position
        };
        assert!((orb(&long_scene) - orb(&short_scene)).length() < EPSILON);
    }

    #[test]
    fn test_forward_moves_along_z() {
        let (mut sim, mut scene) = playground();
        // 5 units/s for 0.2 s
        let state = sim.step(&mut scene, forward(), 0.2);
        let position = state.player_position.unwrap();
        assert!((position.z - 1.0).abs() < EPSILON);
        assert!(position.x.abs() < EPSILON);
        assert!((position.y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_player_entity_follows_controller() {
        let (mut sim, mut scene) = playground();
        let state = sim.step(&mut scene, forward(), 0.1);

        let key = scene.player.as_ref().unwrap().key;
        let entity = scene.world.get_entity(key).unwrap();
        assert_eq!(entity.transform.position, state.player_position.unwrap());
    }

    #[test]
    fn test_idle_input_keeps_player_still() {
        let (mut sim, mut scene) = playground();
        let state = sim.step(&mut scene, InputSnapshot::IDLE, 0.1);
        assert_eq!(state.player_position, Some(Vec3::new(0.0, 1.0, 0.0)));
        assert!(!state.collided);
    }

    #[test]
    fn test_obstacle_blocks_player() {
        let (mut sim, mut scene) = playground();
        let right = InputSnapshot { right: true, ..InputSnapshot::IDLE };
        // Obstacle face at x = 3, capsule radius 0.5
        for _ in 0..20 {
            sim.step(&mut scene, right, 0.1);
        }
        let position = scene.player_position().unwrap();
        assert!((position.x - 2.5).abs() < EPSILON, "x = {}", position.x);
    }

    #[test]
    fn test_secondary_pose_follows_orbit() {
        let (mut sim, mut scene) = playground();
        let state = sim.step(&mut scene, InputSnapshot::IDLE, 0.0);
        // Orbit r = 10, h = 5 starts on +X
        assert!((state.secondary_pose.eye - Vec3::new(10.0, 5.0, 0.0)).length() < EPSILON);
        assert_eq!(state.secondary_pose.target, Vec3::ZERO);
    }

    #[test]
    fn test_view_projection_matches_pose() {
        let (mut sim, mut scene) = playground();
        let state = sim.step(&mut scene, InputSnapshot::IDLE, 0.1);
        let aspect = AppConfig::default().secondary.aspect_ratio();
        assert_eq!(state.secondary_aspect, aspect);
        assert_eq!(state.secondary_view_projection, state.secondary_pose.view_projection(aspect));
    }

    #[test]
    fn test_secondary_aspect_rebuilds_view_projection() {
        let (mut sim, mut scene) = playground();
        let state = sim.step(&mut scene, InputSnapshot::IDLE, 0.1);
        let wide = state.with_secondary_aspect(2.0);

        assert_eq!(wide.secondary_aspect, 2.0);
        assert_eq!(wide.secondary_view_projection, state.secondary_pose.view_projection(2.0));
        assert_ne!(wide.secondary_view_projection, state.secondary_view_projection);
        assert_eq!(wide.secondary_pose.eye, state.secondary_pose.eye);
    }

    #[test]
    fn test_fallback_orbit_used() {
        let instance = SceneBuilder::new("bare")
            .add_entity(visimask_core::EntityTemplate::new(
                visimask_core::MeshTemplate::cube(1.0),
                visimask_core::Transform::identity(),
                MaterialDesc::default(),
            ))
            .build()
            .instantiate();
        let orbit = OrbitPath::new(3.0, 2.0, 0.0);
        let scene = ActiveScene::new(instance, orbit);
        assert_eq!(scene.secondary_orbit, orbit);
    }

    #[test]
    fn test_animation_runs_on_elapsed_time() {
        let (mut sim, mut scene) = playground();
        let key = scene.world.key_by_name("orb").unwrap();
        let start = scene.world.get_entity(key).unwrap().transform.position;

        sim.step(&mut scene, InputSnapshot::IDLE, 0.2);
        let moved = scene.world.get_entity(key).unwrap().transform.position;
        assert!((moved - start).length() > EPSILON);
    }
}
