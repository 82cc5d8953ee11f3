//! Material plugin interface
//!
//! A [`MaterialPlugin`] extends a base material shader without knowing which
//! backend renders it. It contributes:
//!
//! - WGSL fragments for named [`InjectionPoint`]s, usually wrapped in
//!   `#ifdef` so they compile away when the plugin is off
//! - shader defines, which select the compiled variant
//! - a uniform block and texture slots, filled before each draw
//!
//! [`PluginMaterial`] keeps an ordered plugin list and notices when a plugin
//! asks for a different shader variant.

use std::any::Any;

use crate::defines::ShaderDefines;
use crate::uniforms::{ParameterBlock, ShaderParameterSink, TextureSlot, UniformDecl};

/// Default plugin ordering priority (lower runs first)
pub const DEFAULT_PRIORITY: i32 = 100;

/// Shader stage an injection point belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Named places in the base shader where plugin code is inserted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InjectionPoint {
    /// Module scope before the vertex entry point (declarations, bindings)
    VertexDefinitions,
    /// Inside the vertex output struct
    Varyings,
    /// Start of the vertex entry point, after `world_position` is computed
    VertexMainBegin,
    /// Module scope before the fragment entry point (helper functions)
    FragmentDefinitions,
    /// End of the fragment entry point, before `color` is returned
    FragmentBeforeFragColor,
}

impl InjectionPoint {
    pub const ALL: [InjectionPoint; 5] = [
        InjectionPoint::VertexDefinitions,
        InjectionPoint::Varyings,
        InjectionPoint::VertexMainBegin,
        InjectionPoint::FragmentDefinitions,
        InjectionPoint::FragmentBeforeFragColor,
    ];

    /// Marker name used in `//#inject NAME` lines
    pub const fn marker(self) -> &'static str {
        match self {
            InjectionPoint::VertexDefinitions => "CUSTOM_VERTEX_DEFINITIONS",
            InjectionPoint::Varyings => "CUSTOM_VARYINGS",
            InjectionPoint::VertexMainBegin => "CUSTOM_VERTEX_MAIN_BEGIN",
            InjectionPoint::FragmentDefinitions => "CUSTOM_FRAGMENT_DEFINITIONS",
            InjectionPoint::FragmentBeforeFragColor => "CUSTOM_FRAGMENT_BEFORE_FRAGCOLOR",
        }
    }

    pub fn from_marker(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.marker() == name)
    }

    pub const fn stage(self) -> ShaderStage {
        match self {
            InjectionPoint::VertexDefinitions
            | InjectionPoint::Varyings
            | InjectionPoint::VertexMainBegin => ShaderStage::Vertex,
            InjectionPoint::FragmentDefinitions | InjectionPoint::FragmentBeforeFragColor => {
                ShaderStage::Fragment
            }
        }
    }
}

/// A shader extension attached to a material
pub trait MaterialPlugin: Any {
    /// Stable name used in logs
    fn class_name(&self) -> &'static str;

    /// Ordering among plugins of one material (lower first)
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn is_enabled(&self) -> bool;

    /// Write this plugin's defines for the current state
    fn prepare_defines(&self, defines: &mut ShaderDefines);

    /// Members of this plugin's uniform block
    fn uniforms(&self) -> &'static [UniformDecl] {
        &[]
    }

    /// Texture bindings after the uniform block (binding 1, 2, ...)
    fn textures(&self) -> &'static [TextureSlot] {
        &[]
    }

    /// Write per-draw values; called before every draw while enabled
    fn bind_for_draw(&self, sink: &mut dyn ShaderParameterSink);

    /// WGSL for an injection point; `PLUGIN_GROUP` is replaced by this
    /// plugin's bind group index
    fn custom_code(&self, _point: InjectionPoint) -> Option<&'static str> {
        None
    }

    /// Return and clear the "defines changed" flag
    fn take_defines_dirty(&mut self) -> bool;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A material with an ordered set of plugins
pub struct PluginMaterial {
    name: String,
    base_defines: ShaderDefines,
    plugins: Vec<Box<dyn MaterialPlugin>>,
    defines: ShaderDefines,
    variant_key: Option<String>,
}

impl PluginMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_defines: ShaderDefines::new(),
            plugins: Vec::new(),
            defines: ShaderDefines::new(),
            variant_key: None,
        }
    }

    /// Set a material-level define (not owned by any plugin)
    pub fn with_define(mut self, name: &str, value: bool) -> Self {
        self.set_define(name, value);
        self
    }

    pub fn with_plugin(mut self, plugin: impl MaterialPlugin) -> Self {
        self.add_plugin(Box::new(plugin));
        self
    }

    pub fn set_define(&mut self, name: &str, value: bool) {
        if self.base_defines.set(name, value) {
            self.variant_key = None;
        }
    }

    /// Attach a plugin, keeping the list sorted by priority
    ///
    /// Plugins of equal priority keep insertion order.
    pub fn add_plugin(&mut self, plugin: Box<dyn MaterialPlugin>) {
        log::debug!("Material '{}': adding plugin {}", self.name, plugin.class_name());
        let at = self
            .plugins
            .iter()
            .position(|p| p.priority() > plugin.priority())
            .unwrap_or(self.plugins.len());
        self.plugins.insert(at, plugin);
        self.variant_key = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugins(&self) -> &[Box<dyn MaterialPlugin>] {
        &self.plugins
    }

    /// Defines of the current variant (material plus plugins)
    pub fn defines(&self) -> &ShaderDefines {
        &self.defines
    }

    /// Key of the current variant, if it has been computed
    pub fn variant_key(&self) -> Option<&str> {
        self.variant_key.as_deref()
    }

    /// Recompute defines if any plugin marked them dirty
    ///
    /// Returns the new variant key when it differs from the previous one
    /// (always on the first call). Returns `None` when nothing changed, or
    /// when toggles cancelled out and the same variant applies.
    pub fn refresh_variant(&mut self) -> Option<String> {
        // Every plugin's flag must be cleared, so no short-circuit here.
        let mut dirty = self.variant_key.is_none();
        for plugin in self.plugins.iter_mut() {
            dirty |= plugin.take_defines_dirty();
        }
        if !dirty {
            return None;
        }

        let mut defines = self.base_defines.clone();
        for plugin in &self.plugins {
            plugin.prepare_defines(&mut defines);
        }
        let key = defines.variant_key();
        self.defines = defines;

        if self.variant_key.as_deref() == Some(key.as_str()) {
            return None;
        }
        log::debug!("Material '{}': shader variant is now {}", self.name, key);
        self.variant_key = Some(key.clone());
        Some(key)
    }

    /// One parameter block per plugin, in plugin order
    pub fn create_parameter_blocks(&self) -> Vec<ParameterBlock> {
        self.plugins
            .iter()
            .map(|p| ParameterBlock::new(p.uniforms(), p.textures()))
            .collect()
    }

    /// Run every enabled plugin's draw-time hook against its block
    ///
    /// `sinks[i]` belongs to `plugins()[i]`.
    pub fn bind_for_draw<S: ShaderParameterSink>(&self, sinks: &mut [S]) {
        if sinks.len() != self.plugins.len() {
            log::warn!(
                "Material '{}': {} parameter blocks for {} plugins",
                self.name,
                sinks.len(),
                self.plugins.len()
            );
        }
        for (plugin, sink) in self.plugins.iter().zip(sinks.iter_mut()) {
            if plugin.is_enabled() {
                plugin.bind_for_draw(sink);
            }
        }
    }

    /// First plugin of type `T`
    pub fn plugin<T: MaterialPlugin>(&self) -> Option<&T> {
        self.plugins.iter().find_map(|p| p.as_any().downcast_ref::<T>())
    }

    /// First plugin of type `T`, mutably
    pub fn plugin_mut<T: MaterialPlugin>(&mut self) -> Option<&mut T> {
        self.plugins
            .iter_mut()
            .find_map(|p| p.as_any_mut().downcast_mut::<T>())
    }
}

impl std::fmt::Debug for PluginMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.plugins.iter().map(|p| p.class_name()).collect();
        f.debug_struct("PluginMaterial")
            .field("name", &self.name)
            .field("plugins", &names)
            .field("variant_key", &self.variant_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::UniformKind;
    use visimask_math::{Mat4, Vec3};

    struct Toggle {
        name: &'static str,
        priority: i32,
        enabled: bool,
        dirty: bool,
    }

    impl Toggle {
        fn new(name: &'static str, priority: i32) -> Self {
            Self { name, priority, enabled: true, dirty: true }
        }

        fn set_enabled(&mut self, enabled: bool) {
            if self.enabled != enabled {
                self.enabled = enabled;
                self.dirty = true;
            }
        }
    }

    const TOGGLE_UNIFORMS: &[UniformDecl] = &[UniformDecl::new("value", UniformKind::Float)];

    impl MaterialPlugin for Toggle {
        fn class_name(&self) -> &'static str {
            self.name
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
        fn prepare_defines(&self, defines: &mut ShaderDefines) {
            defines.set(self.name, self.enabled);
        }
        fn uniforms(&self) -> &'static [UniformDecl] {
            TOGGLE_UNIFORMS
        }
        fn bind_for_draw(&self, sink: &mut dyn ShaderParameterSink) {
            sink.set_float("value", self.priority as f32);
        }
        fn take_defines_dirty(&mut self) -> bool {
            std::mem::replace(&mut self.dirty, false)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Sink that records float writes
    #[derive(Default)]
    struct Recorder(Vec<(String, f32)>);

    impl ShaderParameterSink for Recorder {
        fn set_float(&mut self, name: &str, value: f32) {
            self.0.push((name.to_string(), value));
        }
        fn set_vec3(&mut self, _: &str, _: Vec3) {}
        fn set_mat4(&mut self, _: &str, _: &Mat4) {}
        fn set_texture(&mut self, _: &str, _: Option<crate::TextureId>) {}
    }

    #[test]
    fn test_marker_round_trip() {
        for p in InjectionPoint::ALL {
            assert_eq!(InjectionPoint::from_marker(p.marker()), Some(p));
        }
        assert_eq!(InjectionPoint::from_marker("CUSTOM_NOPE"), None);
        assert_eq!(InjectionPoint::Varyings.stage(), ShaderStage::Vertex);
    }

    #[test]
    fn test_plugins_sorted_by_priority() {
        let m = PluginMaterial::new("m")
            .with_plugin(Toggle::new("LATE", 200))
            .with_plugin(Toggle::new("EARLY", 10))
            .with_plugin(Toggle::new("MID", 100));
        let names: Vec<_> = m.plugins().iter().map(|p| p.class_name()).collect();
        assert_eq!(names, ["EARLY", "MID", "LATE"]);
    }

    #[test]
    fn test_refresh_variant_only_when_dirty() {
        let mut m = PluginMaterial::new("m").with_plugin(Toggle::new("A", 100));
        assert_eq!(m.refresh_variant().as_deref(), Some("A"));
        assert_eq!(m.refresh_variant(), None);

        m.plugin_mut::<Toggle>().unwrap().set_enabled(false);
        assert_eq!(m.refresh_variant().as_deref(), Some("default"));
        assert!(!m.defines().is_set("A"));
    }

    #[test]
    fn test_toggle_back_and_forth_keeps_variant() {
        let mut m = PluginMaterial::new("m").with_plugin(Toggle::new("A", 100));
        m.refresh_variant();
        let t = m.plugin_mut::<Toggle>().unwrap();
        t.set_enabled(false);
        t.set_enabled(true);
        assert_eq!(m.refresh_variant(), None);
        assert_eq!(m.variant_key(), Some("A"));
    }

    #[test]
    fn test_material_defines_join_key() {
        let mut m = PluginMaterial::new("m")
            .with_define("DIFFUSE_TEXTURE", true)
            .with_plugin(Toggle::new("A", 100));
        assert_eq!(m.refresh_variant().as_deref(), Some("A+DIFFUSE_TEXTURE"));
    }

    #[test]
    fn test_bind_for_draw_skips_disabled() {
        let mut m = PluginMaterial::new("m")
            .with_plugin(Toggle::new("A", 1))
            .with_plugin(Toggle::new("B", 2));
        m.plugins[1].as_any_mut().downcast_mut::<Toggle>().unwrap().enabled = false;

        let mut sinks = vec![Recorder::default(), Recorder::default()];
        m.bind_for_draw(&mut sinks);
        assert_eq!(sinks[0].0, vec![("value".to_string(), 1.0)]);
        assert!(sinks[1].0.is_empty());
    }

    #[test]
    fn test_parameter_blocks_follow_plugins() {
        let m = PluginMaterial::new("m").with_plugin(Toggle::new("A", 1));
        let blocks = m.create_parameter_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].layout().get("value"), Some((0, UniformKind::Float)));
    }
}
