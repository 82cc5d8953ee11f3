//! Square-region mask plugin
//!
//! Keeps fragments within a square around the player in the XZ plane. See
//! [`crate::square`] for the CPU version of the same test.

use std::any::Any;

use visimask_math::Vec3;

use crate::defines::ShaderDefines;
use crate::plugin::{InjectionPoint, MaterialPlugin};
use crate::square::{SquareMaskStyle, SquareRegion};
use crate::uniforms::{ShaderParameterSink, TextureSlot, UniformDecl, UniformKind};

pub const DEFINE: &str = "SQUARE_MASK";
pub const DEFINE_BINARY: &str = "SQUARE_MASK_BINARY";

pub const U_PLAYER_POSITION: &str = "player_position";
pub const U_SQUARE_SIZE: &str = "square_size";

/// Half extent used until [`SquareMaskPlugin::set_size`] is called
pub const DEFAULT_SQUARE_SIZE: f32 = 10.0;

const UNIFORMS: &[UniformDecl] = &[
    UniformDecl::new(U_PLAYER_POSITION, UniformKind::Vec3),
    UniformDecl::new(U_SQUARE_SIZE, UniformKind::Float),
];

const VERTEX_DEFINITIONS: &str = "\
#ifdef SQUARE_MASK
struct SquareMaskUniforms {
    player_position: vec3<f32>,
    square_size: f32,
};
@group(PLUGIN_GROUP) @binding(0) var<uniform> square_mask: SquareMaskUniforms;
#endif
";

const FRAGMENT_BEFORE_FRAGCOLOR: &str = "\
#ifdef SQUARE_MASK
    {
        let square_delta = abs(in.world_position - square_mask.player_position);
        let square_inside = square_delta.x <= square_mask.square_size && square_delta.z <= square_mask.square_size;
#ifdef SQUARE_MASK_BINARY
        color = select(vec4<f32>(0.0, 0.0, 0.0, 1.0), vec4<f32>(1.0, 1.0, 1.0, 1.0), square_inside);
#else
        if !square_inside {
            color = vec4<f32>(0.0, 0.0, 0.0, 1.0);
        }
#endif
    }
#endif
";

/// Masks out everything beyond a square around a reference point
#[derive(Debug)]
pub struct SquareMaskPlugin {
    enabled: bool,
    defines_dirty: bool,
    region: SquareRegion,
    style: SquareMaskStyle,
}

impl SquareMaskPlugin {
    pub fn new() -> Self {
        Self {
            enabled: true,
            defines_dirty: true,
            region: SquareRegion::new(Vec3::ZERO, DEFAULT_SQUARE_SIZE),
            style: SquareMaskStyle::Recolor,
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.set_size(size);
        self
    }

    pub fn with_style(mut self, style: SquareMaskStyle) -> Self {
        self.set_style(style);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        self.defines_dirty = true;
    }

    /// Move the square's center; called every frame with the player position
    pub fn set_position(&mut self, position: Vec3) {
        self.region.set_center(position);
    }

    /// Half extent of the square; negative sizes are clamped to 0
    pub fn set_size(&mut self, size: f32) {
        self.region.set_half_extent(size);
    }

    pub fn set_style(&mut self, style: SquareMaskStyle) {
        if self.style != style {
            self.style = style;
            self.defines_dirty = true;
        }
    }

    pub fn region(&self) -> &SquareRegion {
        &self.region
    }

    pub fn style(&self) -> SquareMaskStyle {
        self.style
    }
}

impl Default for SquareMaskPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialPlugin for SquareMaskPlugin {
    fn class_name(&self) -> &'static str {
        "SquareMaskPlugin"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn prepare_defines(&self, defines: &mut ShaderDefines) {
        defines.set(DEFINE, self.enabled);
        defines.set(DEFINE_BINARY, self.enabled && self.style == SquareMaskStyle::Binary);
    }

    fn uniforms(&self) -> &'static [UniformDecl] {
        UNIFORMS
    }

    fn textures(&self) -> &'static [TextureSlot] {
        &[]
    }

    fn bind_for_draw(&self, sink: &mut dyn ShaderParameterSink) {
        sink.set_vec3(U_PLAYER_POSITION, self.region.center());
        sink.set_float(U_SQUARE_SIZE, self.region.half_extent());
    }

    fn custom_code(&self, point: InjectionPoint) -> Option<&'static str> {
        match point {
            InjectionPoint::VertexDefinitions => Some(VERTEX_DEFINITIONS),
            InjectionPoint::FragmentBeforeFragColor => Some(FRAGMENT_BEFORE_FRAGCOLOR),
            _ => None,
        }
    }

    fn take_defines_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.defines_dirty, false)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
