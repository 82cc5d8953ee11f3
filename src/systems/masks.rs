//! Mask plugin setup and per-frame updates
//!
//! Every masked entity gets its own [`PluginMaterial`] carrying the scene's
//! masks. Each frame the frustum plugins receive the secondary camera's
//! view-projection and depth texture, and the square plugins the player
//! position. Nothing here touches the GPU.

use visimask_core::{Entity, MaskKind};
use visimask_mask::{DarkenPolicy, FrustumMaskPlugin, PluginMaterial, SquareMaskPlugin, SquareMaskStyle, TextureId};

use super::simulation::FrameState;
use crate::config::MaskConfig;

/// User-toggled mask state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskToggles {
    pub enabled: bool,
    pub square_style: SquareMaskStyle,
}

impl MaskToggles {
    pub fn new(config: &MaskConfig) -> Self {
        Self { enabled: true, square_style: config.square_style }
    }

    pub fn toggle_enabled(&mut self) {
        self.enabled = !self.enabled;
        log::info!("Masks {}", if self.enabled { "enabled" } else { "disabled" });
    }

    pub fn toggle_square_style(&mut self) {
        self.square_style = self.square_style.toggled();
        log::info!("Square mask style: {:?}", self.square_style);
    }
}

/// Material for one entity; unmasked entities get no plugins
///
/// The frustum mask goes first so its darkening runs before the square
/// mask recolors.
pub fn build_material(entity: &Entity, masks: &[MaskKind], config: &MaskConfig) -> PluginMaterial {
    let name = entity.name.clone().unwrap_or_else(|| "entity".to_string());
    let mut material = PluginMaterial::new(name);
    if !entity.material.masked {
        return material;
    }

    if masks.contains(&MaskKind::Frustum) {
        material.add_plugin(Box::new(
            FrustumMaskPlugin::new()
                .with_darken(DarkenPolicy::new(config.darken_factor))
                .with_depth_bias(config.depth_bias),
        ));
    }
    if masks.contains(&MaskKind::Square) {
        material.add_plugin(Box::new(
            SquareMaskPlugin::new().with_size(config.square_size).with_style(config.square_style),
        ));
    }
    material
}

/// Push this frame's values into a material's mask plugins
pub fn update_material(
    material: &mut PluginMaterial,
    frame: &FrameState,
    depth_texture: Option<TextureId>,
    toggles: &MaskToggles,
) {
    if let Some(frustum) = material.plugin_mut::<FrustumMaskPlugin>() {
        frustum.set_enabled(toggles.enabled);
        frustum.set_view_projection(frame.secondary_view_projection);
        frustum.set_depth_texture(depth_texture);
    }
    if let Some(square) = material.plugin_mut::<SquareMaskPlugin>() {
        square.set_enabled(toggles.enabled);
        square.set_style(toggles.square_style);
        if let Some(position) = frame.player_position {
            square.set_position(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::scene::SceneBuilder;
    use crate::systems::simulation::{ActiveScene, SimulationSystem};
    use visimask_core::{MaterialDesc, MeshTemplate, OrbitPath, Transform, Vec3};
    use visimask_input::InputSnapshot;
    use visimask_mask::MaterialPlugin;

    fn entity(masked: bool) -> Entity {
        Entity::new(
            MeshTemplate::cube(1.0),
            Transform::identity(),
            MaterialDesc::default().with_masked(masked),
        )
        .with_name("crate")
    }

    fn frame_state() -> FrameState {
        let config = AppConfig::default();
        let mut scene = ActiveScene::new(SceneBuilder::playground().instantiate(), OrbitPath::default());
        let mut sim = SimulationSystem::new(&config);
        let forward = InputSnapshot { forward: true, ..InputSnapshot::IDLE };
        sim.step(&mut scene, forward, 0.1)
    }

    fn both() -> Vec<MaskKind> {
        vec![MaskKind::Frustum, MaskKind::Square]
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_masked_entity_gets_both_plugins_in_order() {
        let material = build_material(&entity(true), &both(), &MaskConfig::default());
        let names: Vec<&str> = material.plugins().iter().map(|p| p.class_name()).collect();
        assert_eq!(names, vec!["FrustumMaskPlugin", "SquareMaskPlugin"]);
        assert_eq!(material.name(), "crate");
    }

    #[test]
    fn test_unmasked_entity_has_no_plugins() {
        let material = build_material(&entity(false), &both(), &MaskConfig::default());
        assert!(material.plugins().is_empty());
    }

    #[test]
    fn test_scene_masks_filter_plugins() {
        let material = build_material(&entity(true), &[MaskKind::Square], &MaskConfig::default());
        assert!(material.plugin::<FrustumMaskPlugin>().is_none());
        assert!(material.plugin::<SquareMaskPlugin>().is_some());
    }

    #[test]
    fn test_config_flows_into_plugins() {
        let config = MaskConfig {
            darken_factor: 0.0,
            depth_bias: 0.01,
            square_size: 3.0,
            square_style: SquareMaskStyle::Binary,
        };
        let material = build_material(&entity(true), &both(), &config);

        let frustum = material.plugin::<FrustumMaskPlugin>().unwrap();
        assert_eq!(frustum.darken(), DarkenPolicy::BLACK);
        assert_eq!(frustum.depth_bias(), 0.01);

        let square = material.plugin::<SquareMaskPlugin>().unwrap();
        assert_eq!(square.region().half_extent(), 3.0);
        assert_eq!(square.style(), SquareMaskStyle::Binary);
    }

    // ==================== Per-Frame Update Tests ====================

    #[test]
    fn test_frame_values_reach_plugins() {
        let mut material = build_material(&entity(true), &both(), &MaskConfig::default());
        let frame = frame_state();
        let toggles = MaskToggles::new(&MaskConfig::default());

        update_material(&mut material, &frame, Some(TextureId(7)), &toggles);

        let frustum = material.plugin::<FrustumMaskPlugin>().unwrap();
        assert_eq!(*frustum.view_projection(), frame.secondary_view_projection);
        assert_eq!(frustum.depth_texture(), Some(TextureId(7)));

        let square = material.plugin::<SquareMaskPlugin>().unwrap();
        assert_eq!(Some(square.region().center()), frame.player_position);
    }

    #[test]
    fn test_missing_depth_texture_is_cleared() {
        let mut material = build_material(&entity(true), &both(), &MaskConfig::default());
        let frame = frame_state();
        let toggles = MaskToggles::new(&MaskConfig::default());

        update_material(&mut material, &frame, Some(TextureId(1)), &toggles);
        update_material(&mut material, &frame, None, &toggles);
        assert_eq!(material.plugin::<FrustumMaskPlugin>().unwrap().depth_texture(), None);
    }

    #[test]
    fn test_toggle_changes_variant_only() {
        let mut material = build_material(&entity(true), &both(), &MaskConfig::default());
        let frame = frame_state();
        let mut toggles = MaskToggles::new(&MaskConfig::default());
        update_material(&mut material, &frame, Some(TextureId(1)), &toggles);
        let before = material.refresh_variant();
        assert!(before.is_some());

        toggles.toggle_enabled();
        update_material(&mut material, &frame, Some(TextureId(1)), &toggles);
        let after = material.refresh_variant();
        assert!(after.is_some(), "Disabling the masks must change the variant");
        assert_ne!(before, after);

        let frustum = material.plugin::<FrustumMaskPlugin>().unwrap();
        assert!(!frustum.is_enabled());
        assert_eq!(frustum.depth_texture(), Some(TextureId(1)));
        assert_eq!(*frustum.view_projection(), frame.secondary_view_projection);
    }

    #[test]
    fn test_square_style_toggle() {
        let mut material = build_material(&entity(true), &both(), &MaskConfig::default());
        let frame = frame_state();
        let mut toggles = MaskToggles::new(&MaskConfig::default());
        toggles.toggle_square_style();
        update_material(&mut material, &frame, None, &toggles);
        assert_eq!(material.plugin::<SquareMaskPlugin>().unwrap().style(), SquareMaskStyle::Binary);
    }

    #[test]
    fn test_square_keeps_center_without_player() {
        let mut material = build_material(&entity(true), &[MaskKind::Square], &MaskConfig::default());
        let mut frame = frame_state();
        frame.player_position = None;
        update_material(&mut material, &frame, None, &MaskToggles::new(&MaskConfig::default()));
        assert_eq!(material.plugin::<SquareMaskPlugin>().unwrap().region().center(), Vec3::ZERO);
    }
}
