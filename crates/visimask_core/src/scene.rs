//! Scene serialization
//!
//! A Scene is a RON template: entity templates plus the player spawn point,
//! the secondary camera's orbit and which masks the scene uses. Instantiating
//! it produces a live [`World`] and the matching [`CollisionWorld`].

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use visimask_math::Vec3;
use visimask_physics::CollisionWorld;

use crate::animation::OrbitPath;
use crate::entity::EntityTemplate;
use crate::world::World;

/// Mask plugins a scene attaches to its masked materials
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskKind {
    Frustum,
    Square,
}

fn default_masks() -> Vec<MaskKind> {
    vec![MaskKind::Frustum, MaskKind::Square]
}

/// A serializable scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name (for display/debugging)
    pub name: String,
    pub entities: Vec<EntityTemplate>,
    /// Player capsule center at spawn [x, y, z]
    #[serde(default)]
    pub player_spawn: Option<[f32; 3]>,
    /// Path of the secondary (masking) camera
    #[serde(default)]
    pub secondary_orbit: Option<OrbitPath>,
    #[serde(default = "default_masks")]
    pub masks: Vec<MaskKind>,
    /// Main camera eye position; the camera looks at the origin
    #[serde(default)]
    pub camera_position: Option<[f32; 3]>,
    /// Run the posterize pass by default
    #[serde(default)]
    pub post_process: bool,
}

/// A scene whose templates have been turned into live objects
pub struct SceneInstance {
    pub name: String,
    pub world: World,
    pub collision: CollisionWorld,
    pub player_spawn: Option<Vec3>,
    pub secondary_orbit: Option<OrbitPath>,
    pub masks: Vec<MaskKind>,
    pub camera_position: Option<Vec3>,
    pub post_process: bool,
}

impl Scene {
    /// Create a new empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
            player_spawn: None,
            secondary_orbit: None,
            masks: default_masks(),
            camera_position: None,
            post_process: false,
        }
    }

    /// Load a scene from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    pub fn from_ron(contents: &str) -> Result<Self, SceneError> {
        Ok(ron::from_str(contents)?)
    }

    pub fn to_ron(&self) -> Result<String, SceneError> {
        let pretty = ron::ser::PrettyConfig::new()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Save a scene to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneError> {
        fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    pub fn add_entity(&mut self, entity: EntityTemplate) {
        self.entities.push(entity);
    }

    pub fn with_entity(mut self, entity: EntityTemplate) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_player_spawn(mut self, x: f32, y: f32, z: f32) -> Self {
        self.player_spawn = Some([x, y, z]);
        self
    }

    pub fn with_secondary_orbit(mut self, orbit: OrbitPath) -> Self {
        self.secondary_orbit = Some(orbit);
        self
    }

    pub fn with_masks(mut self, masks: Vec<MaskKind>) -> Self {
        self.masks = masks;
        self
    }

    pub fn with_camera_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.camera_position = Some([x, y, z]);
        self
    }

    pub fn with_post_process(mut self, enabled: bool) -> Self {
        self.post_process = enabled;
        self
    }

    pub fn uses_mask(&self, kind: MaskKind) -> bool {
        self.masks.contains(&kind)
    }

    /// Build the live world and colliders from this template
    pub fn instantiate(&self) -> SceneInstance {
        let mut world = World::with_capacity(self.entities.len());
        let mut collision = CollisionWorld::new();

        for template in &self.entities {
            let entity = template.to_entity();
            if let Some(collider) = entity.collider() {
                collision.add(collider);
            }
            world.add_entity(entity);
        }

        log::info!(
            "Instantiated scene '{}': {} entities, {} colliders",
            self.name,
            world.entity_count(),
            collision.len()
        );

        SceneInstance {
            name: self.name.clone(),
            world,
            collision,
            player_spawn: self.player_spawn.map(Vec3::from),
            secondary_orbit: self.secondary_orbit,
            masks: self.masks.clone(),
            camera_position: self.camera_position.map(Vec3::from),
            post_process: self.post_process,
        }
    }
}

/// Error loading or saving a scene
#[derive(Debug)]
pub enum SceneError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid RON syntax)
    Parse(ron::error::SpannedError),
    /// Serialization error
    Serialize(ron::Error),
}

impl From<io::Error> for SceneError {
    fn from(e: io::Error) -> Self {
        SceneError::Io(e)
    }
}

impl From<ron::error::SpannedError> for SceneError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneError::Parse(e)
    }
}

impl From<ron::Error> for SceneError {
    fn from(e: ron::Error) -> Self {
        SceneError::Serialize(e)
    }
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::Io(e) => write!(f, "IO error: {}", e),
            SceneError::Parse(e) => write!(f, "Parse error: {}", e),
            SceneError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Io(e) => Some(e),
            SceneError::Parse(e) => Some(e),
            SceneError::Serialize(e) => Some(e),
        }
    }
}
