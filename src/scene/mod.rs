//! Scene construction utilities
//!
//! Scenes come from `<scenes_dir>/<name>.ron` when that file exists, otherwise
//! from the built-ins of [`SceneBuilder`].

mod scene_builder;

use std::path::Path;

use visimask_core::Scene;

use crate::config::SceneConfig;

pub use scene_builder::{SceneBuilder, BUILTIN_SCENES, PLAYER_HEIGHT, PLAYER_NAME, PLAYER_RADIUS};

/// Resolve the configured scene
///
/// Never fails: an unreadable file falls back to the built-in of the same
/// name, and an unknown name falls back to the playground.
pub fn load_scene(config: &SceneConfig) -> Scene {
    let path = Path::new(&config.scenes_dir).join(format!("{}.ron", config.name));
    if path.exists() {
        match Scene::load(&path) {
            Ok(scene) => {
                log::info!("Loaded scene '{}' from {}", scene.name, path.display());
                return scene;
            }
            Err(e) => log::warn!("Failed to load {}: {}", path.display(), e),
        }
    }

    SceneBuilder::builtin(&config.name).unwrap_or_else(|| {
        log::warn!(
            "Unknown scene '{}' (built-ins: {}); using playground",
            config.name,
            BUILTIN_SCENES.join(", ")
        );
        SceneBuilder::playground()
    })
}
