//! SceneBuilder - Declarative scene construction
//!
//! Provides a fluent API for building scene templates, plus the two
//! built-in demo scenes.

use visimask_core::{
    Animation, EntityTemplate, MaskKind, MaterialDesc, MeshTemplate, OrbitPath, Scene, Transform, Vec3,
};

/// Name of the entity the character controller drives
pub const PLAYER_NAME: &str = "player";

/// Player capsule dimensions
pub const PLAYER_HEIGHT: f32 = 2.0;
pub const PLAYER_RADIUS: f32 = 0.5;

/// Names accepted by [`SceneBuilder::builtin`]
pub const BUILTIN_SCENES: [&str; 2] = ["playground", "showcase"];

/// Builder for constructing scene templates
///
/// # Example
/// ```ignore
/// let scene = SceneBuilder::new("arena")
///     .add_ground(40.0, 40.0)
///     .add_obstacle(Vec3::new(4.0, 1.0, 0.0), 2.0, MaterialDesc::from_rgb(0.8, 0.2, 0.2))
///     .add_player(Vec3::new(0.0, 1.0, 0.0))
///     .build();
/// ```
pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    /// Create a new scene builder
    pub fn new(name: impl Into<String>) -> Self {
        Self { scene: Scene::new(name) }
    }

    /// Add a collidable checkerboard ground centered at the origin
    pub fn add_ground(mut self, width: f32, depth: f32) -> Self {
        self.scene.add_entity(
            EntityTemplate::new(MeshTemplate::ground(width, depth), Transform::identity(), MaterialDesc::checkerboard())
                .with_name("ground")
                .with_tag("static")
                .with_collidable(true),
        );
        self
    }

    /// Add a collidable box resting wherever `center` puts it
    pub fn add_obstacle(mut self, center: Vec3, size: f32, material: MaterialDesc) -> Self {
        let index = self.scene.entities.iter().filter(|e| e.tags.iter().any(|t| t == "obstacle")).count();
        self.scene.add_entity(
            EntityTemplate::new(MeshTemplate::cube(size), Transform::from_position(center), material)
                .with_name(format!("obstacle_{}", index))
                .with_tag("obstacle")
                .with_collidable(true),
        );
        self
    }

    /// Add the player capsule; its center is also the spawn point
    pub fn add_player(mut self, spawn: Vec3) -> Self {
        self.scene.add_entity(
            EntityTemplate::new(
                MeshTemplate::capsule(PLAYER_HEIGHT, PLAYER_RADIUS),
                Transform::from_position(spawn),
                MaterialDesc::from_rgb(1.0, 0.8, 0.2),
            )
            .with_name(PLAYER_NAME)
            .with_tag("player"),
        );
        self.scene = self.scene.with_player_spawn(spawn.x, spawn.y, spawn.z);
        self
    }

    /// Add an inside-out sphere around the scene
    pub fn add_sky(mut self, diameter: f32, material: MaterialDesc) -> Self {
        self.scene.add_entity(
            EntityTemplate::new(MeshTemplate::sphere(diameter), Transform::identity(), material.with_double_sided(true))
                .with_name("sky"),
        );
        self
    }

    /// Add a custom entity to the scene
    pub fn add_entity(mut self, entity: EntityTemplate) -> Self {
        self.scene.add_entity(entity);
        self
    }

    pub fn with_secondary_orbit(mut self, orbit: OrbitPath) -> Self {
        self.scene = self.scene.with_secondary_orbit(orbit);
        self
    }

    pub fn with_masks(mut self, masks: Vec<MaskKind>) -> Self {
        self.scene = self.scene.with_masks(masks);
        self
    }

    pub fn with_camera_position(mut self, eye: Vec3) -> Self {
        self.scene = self.scene.with_camera_position(eye.x, eye.y, eye.z);
        self
    }

    pub fn with_post_process(mut self, enabled: bool) -> Self {
        self.scene = self.scene.with_post_process(enabled);
        self
    }

    /// Build the scene template
    pub fn build(self) -> Scene {
        self.scene
    }

    /// A built-in scene by name
    pub fn builtin(name: &str) -> Option<Scene> {
        match name {
            "playground" => Some(Self::playground()),
            "showcase" => Some(Self::showcase()),
            _ => None,
        }
    }

    /// Checkerboard arena with obstacles, a movable player and both masks
    pub fn playground() -> Scene {
        Self::new("playground")
            .add_ground(40.0, 40.0)
            .add_obstacle(Vec3::new(4.0, 1.0, 0.0), 2.0, MaterialDesc::from_rgb(0.8, 0.2, 0.2))
            .add_obstacle(Vec3::new(-6.0, 1.0, 5.0), 2.0, MaterialDesc::from_rgb(0.2, 0.8, 0.2))
            .add_obstacle(Vec3::new(3.0, 1.5, -7.0), 3.0, MaterialDesc::checkerboard())
            .add_obstacle(Vec3::new(-8.0, 2.0, -6.0), 4.0, MaterialDesc::from_rgb(0.8, 0.8, 0.8))
            .add_entity(
                EntityTemplate::new(
                    MeshTemplate::sphere(2.0),
                    Transform::from_position(Vec3::new(8.0, 1.0, 8.0)),
                    MaterialDesc::from_rgb(0.0, 0.0, 1.0),
                )
                .with_name("orb")
                .with_animation(Animation::Satellite { radius: 1.5, speed: 0.8, phase: 0.0 }),
            )
            .add_player(Vec3::new(0.0, 1.0, 0.0))
            .with_secondary_orbit(OrbitPath::new(10.0, 5.0, 0.1))
            .with_masks(vec![MaskKind::Frustum, MaskKind::Square])
            .with_camera_position(Vec3::new(15.0, 15.0, 15.0))
            .build()
    }

    /// Spinning box, satellite sphere and sky sphere under the posterize pass
    pub fn showcase() -> Scene {
        let blue = MaterialDesc::from_rgb(0.0, 0.0, 1.0).with_masked(false);
        Self::new("showcase")
            .add_entity(
                EntityTemplate::new(MeshTemplate::cube(1.0), Transform::identity(), blue)
                    .with_name("box")
                    .with_animation(Animation::Spin { rate: Vec3::new(0.6, 0.6, 0.0) }),
            )
            .add_entity(
                EntityTemplate::new(MeshTemplate::sphere(1.0), Transform::identity(), blue)
                    .with_name("sphere")
                    .with_animation(Animation::Satellite { radius: 2.0, speed: 0.6, phase: 0.0 }),
            )
            .add_sky(20.0, blue)
            .with_masks(Vec::new())
            .with_camera_position(Vec3::new(5.0, 5.0, 5.0))
            .with_post_process(true)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scene() {
        let scene = SceneBuilder::new("empty").build();
        assert!(scene.entities.is_empty());
        assert!(scene.player_spawn.is_none());
    }

    #[test]
    fn test_scene_with_ground() {
        let instance = SceneBuilder::new("ground").add_ground(10.0, 10.0).build().instantiate();

        assert_eq!(instance.world.entity_count(), 1);
        assert_eq!(instance.collision.len(), 1);

        let (_, ground) = instance.world.get_by_name("ground").unwrap();
        assert!(ground.has_tag("static"));
        assert!(ground.material.checkerboard);
    }

    #[test]
    fn test_scene_with_player() {
        let scene = SceneBuilder::new("player").add_player(Vec3::new(1.0, 1.0, 2.0)).build();

        assert_eq!(scene.player_spawn, Some([1.0, 1.0, 2.0]));
        let instance = scene.instantiate();
        let (_, player) = instance.world.get_by_name(PLAYER_NAME).unwrap();
        assert!(!player.collidable, "The player must not collide with itself");
    }

    #[test]
    fn test_obstacles_get_unique_names() {
        let instance = SceneBuilder::new("boxes")
            .add_obstacle(Vec3::new(0.0, 1.0, 0.0), 2.0, MaterialDesc::default())
            .add_obstacle(Vec3::new(5.0, 1.0, 0.0), 2.0, MaterialDesc::default())
            .build()
            .instantiate();

        assert!(instance.world.get_by_name("obstacle_0").is_some());
        assert!(instance.world.get_by_name("obstacle_1").is_some());
        assert_eq!(instance.world.get_by_tag("obstacle").count(), 2);
    }

    #[test]
    fn test_sky_is_double_sided() {
        let scene = SceneBuilder::new("sky").add_sky(20.0, MaterialDesc::default()).build();
        assert!(scene.entities[0].material.double_sided);
    }

    #[test]
    fn test_playground_uses_both_masks() {
        let scene = SceneBuilder::playground();
        assert!(scene.uses_mask(MaskKind::Frustum));
        assert!(scene.uses_mask(MaskKind::Square));
        assert!(scene.secondary_orbit.is_some());
        assert!(!scene.post_process);

        let instance = scene.instantiate();
        // Ground and four obstacles
        assert_eq!(instance.collision.len(), 5);
    }

    #[test]
    fn test_showcase_is_unmasked_with_post_process() {
        let scene = SceneBuilder::showcase();
        assert!(scene.masks.is_empty());
        assert!(scene.post_process);
        assert!(scene.entities.iter().all(|e| !e.material.masked));
        assert_eq!(scene.camera_position, Some([5.0, 5.0, 5.0]));
    }

    #[test]
    fn test_builtin_lookup() {
        for name in BUILTIN_SCENES {
            assert_eq!(SceneBuilder::builtin(name).map(|s| s.name), Some(name.to_string()));
        }
        assert!(SceneBuilder::builtin("missing").is_none());
    }
}
