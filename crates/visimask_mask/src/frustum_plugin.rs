//! Frustum and occlusion mask plugin
//!
//! Darkens every fragment the secondary camera cannot see. The vertex stage
//! projects the world position with the secondary view-projection; the
//! fragment stage runs the test described in [`crate::frustum`] against the
//! secondary camera's depth texture.

use std::any::Any;
use std::cell::Cell;

use visimask_math::{mat4, Mat4};

use crate::darken::DarkenPolicy;
use crate::defines::ShaderDefines;
use crate::frustum::DEFAULT_DEPTH_BIAS;
use crate::plugin::{InjectionPoint, MaterialPlugin};
use crate::uniforms::{ShaderParameterSink, TextureId, TextureSlot, UniformDecl, UniformKind};

pub const DEFINE: &str = "FRUSTUM_MASK";

pub const U_VIEW_PROJECTION: &str = "secondary_view_projection";
pub const U_DARKEN_FACTOR: &str = "darken_factor";
pub const U_DEPTH_BIAS: &str = "depth_bias";
pub const T_DEPTH: &str = "depth_texture";

const UNIFORMS: &[UniformDecl] = &[
    UniformDecl::new(U_VIEW_PROJECTION, UniformKind::Mat4),
    UniformDecl::new(U_DARKEN_FACTOR, UniformKind::Float),
    UniformDecl::new(U_DEPTH_BIAS, UniformKind::Float),
];

const TEXTURES: &[TextureSlot] = &[TextureSlot::new(T_DEPTH)];

const VERTEX_DEFINITIONS: &str = "\
#ifdef FRUSTUM_MASK
struct FrustumMaskUniforms {
    secondary_view_projection: mat4x4<f32>,
    darken_factor: f32,
    depth_bias: f32,
};
@group(PLUGIN_GROUP) @binding(0) var<uniform> frustum_mask: FrustumMaskUniforms;
@group(PLUGIN_GROUP) @binding(1) var frustum_depth_texture: texture_2d<f32>;
#endif
";

const VARYINGS: &str = "\
#ifdef FRUSTUM_MASK
    @location(3) secondary_clip: vec4<f32>,
#endif
";

const VERTEX_MAIN_BEGIN: &str = "\
#ifdef FRUSTUM_MASK
    out.secondary_clip = frustum_mask.secondary_view_projection * world_position;
#endif
";

// Depth rows are stored top-down, uv has a bottom-left origin.
// The w guard matches frustum::MIN_CLIP_W.
const FRAGMENT_DEFINITIONS: &str = "\
#ifdef FRUSTUM_MASK
fn frustum_mask_visible(clip: vec4<f32>) -> bool {
    if clip.w < 1e-6 {
        return false;
    }
    let ndc = clip.xyz / clip.w;
    if abs(ndc.x) > 1.0 || abs(ndc.y) > 1.0 || ndc.z < 0.0 {
        return false;
    }
    let uv = ndc.xy * 0.5 + 0.5;
    let size = vec2<i32>(textureDimensions(frustum_depth_texture));
    let texel = vec2<i32>(floor(vec2<f32>(uv.x, 1.0 - uv.y) * vec2<f32>(size)));
    let stored = textureLoad(frustum_depth_texture, clamp(texel, vec2<i32>(0), size - vec2<i32>(1)), 0).r;
    let current = ndc.z * 0.5 + 0.5;
    return !(current - frustum_mask.depth_bias > stored);
}
#endif
";

const FRAGMENT_BEFORE_FRAGCOLOR: &str = "\
#ifdef FRUSTUM_MASK
    if !frustum_mask_visible(in.secondary_clip) {
        color = vec4<f32>(color.rgb * frustum_mask.darken_factor, 1.0);
    }
#endif
";

/// Masks out what the secondary camera cannot see
#[derive(Debug)]
pub struct FrustumMaskPlugin {
    enabled: bool,
    defines_dirty: bool,
    view_projection: Mat4,
    depth_texture: Option<TextureId>,
    darken: DarkenPolicy,
    depth_bias: f32,
    warned_missing_depth: Cell<bool>,
}

impl FrustumMaskPlugin {
    pub fn new() -> Self {
        Self {
            enabled: true,
            defines_dirty: true,
            view_projection: mat4::IDENTITY,
            depth_texture: None,
            darken: DarkenPolicy::DIM,
            depth_bias: DEFAULT_DEPTH_BIAS,
            warned_missing_depth: Cell::new(false),
        }
    }

    pub fn with_darken(mut self, darken: DarkenPolicy) -> Self {
        self.darken = darken;
        self
    }

    pub fn with_depth_bias(mut self, bias: f32) -> Self {
        self.set_depth_bias(bias);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    /// Enable or disable the mask
    ///
    /// Only the shader variant is affected; matrix, texture and tuning stay
    /// as they were.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        self.defines_dirty = true;
    }

    pub fn set_view_projection(&mut self, view_projection: Mat4) {
        self.view_projection = view_projection;
    }

    /// Set or clear the secondary camera's depth texture
    pub fn set_depth_texture(&mut self, texture: Option<TextureId>) {
        if texture.is_some() {
            self.warned_missing_depth.set(false);
        }
        self.depth_texture = texture;
    }

    pub fn set_darken(&mut self, darken: DarkenPolicy) {
        self.darken = darken;
    }

    /// Depth comparison bias; negative values are clamped to 0
    pub fn set_depth_bias(&mut self, bias: f32) {
        self.depth_bias = if bias > 0.0 { bias } else { 0.0 };
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    pub fn depth_texture(&self) -> Option<TextureId> {
        self.depth_texture
    }

    pub fn darken(&self) -> DarkenPolicy {
        self.darken
    }

    pub fn depth_bias(&self) -> f32 {
        self.depth_bias
    }
}

impl Default for FrustumMaskPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialPlugin for FrustumMaskPlugin {
    fn class_name(&self) -> &'static str {
        "FrustumMaskPlugin"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn prepare_defines(&self, defines: &mut ShaderDefines) {
        defines.set(DEFINE, self.enabled);
    }

    fn uniforms(&self) -> &'static [UniformDecl] {
        UNIFORMS
    }

    fn textures(&self) -> &'static [TextureSlot] {
        TEXTURES
    }

    fn bind_for_draw(&self, sink: &mut dyn ShaderParameterSink) {
        sink.set_mat4(U_VIEW_PROJECTION, &self.view_projection);
        sink.set_float(U_DARKEN_FACTOR, self.darken.factor);
        sink.set_float(U_DEPTH_BIAS, self.depth_bias);

        match self.depth_texture {
            Some(texture) => sink.set_texture(T_DEPTH, Some(texture)),
            None => {
                if !self.warned_missing_depth.replace(true) {
                    log::warn!("FrustumMaskPlugin: depth texture is not set; skipping its binding");
                }
                sink.set_texture(T_DEPTH, None);
            }
        }
    }

    fn custom_code(&self, point: InjectionPoint) -> Option<&'static str> {
        Some(match point {
            InjectionPoint::VertexDefinitions => VERTEX_DEFINITIONS,
            InjectionPoint::Varyings => VARYINGS,
            InjectionPoint::VertexMainBegin => VERTEX_MAIN_BEGIN,
            InjectionPoint::FragmentDefinitions => FRAGMENT_DEFINITIONS,
            InjectionPoint::FragmentBeforeFragColor => FRAGMENT_BEFORE_FRAGCOLOR,
        })
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::ParameterBlock;
    use visimask_math::Vec3;

    fn block() -> ParameterBlock {
        ParameterBlock::new(UNIFORMS, TEXTURES)
    }

    #[test]
    fn test_defaults() {
        let p = FrustumMaskPlugin::new();
        assert!(p.is_enabled());
        assert_eq!(p.darken(), DarkenPolicy::DIM);
        assert_eq!(p.depth_bias(), DEFAULT_DEPTH_BIAS);
        assert_eq!(p.depth_texture(), None);
    }

    #[test]
    fn test_toggle_enable_changes_nothing_else() {
        let mut p = FrustumMaskPlugin::new();
        let vp = mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        p.set_view_projection(vp);
        p.set_depth_texture(Some(TextureId(9)));
        p.take_defines_dirty();

        p.set_enabled(false);

        assert!(!p.is_enabled());
        assert!(p.take_defines_dirty());
        assert_eq!(*p.view_projection(), vp);
        assert_eq!(p.depth_texture(), Some(TextureId(9)));
        assert_eq!(p.darken(), DarkenPolicy::DIM);
        assert_eq!(p.depth_bias(), DEFAULT_DEPTH_BIAS);
    }

    #[test]
    fn test_set_enabled_same_value_is_not_dirty() {
        let mut p = FrustumMaskPlugin::new();
        p.take_defines_dirty();
        p.set_enabled(true);
        assert!(!p.take_defines_dirty());
    }

    #[test]
    fn test_prepare_defines_follows_enabled() {
        let mut p = FrustumMaskPlugin::new();
        let mut d = ShaderDefines::new();
        p.prepare_defines(&mut d);
        assert!(d.is_set(DEFINE));
        p.set_enabled(false);
        p.prepare_defines(&mut d);
        assert!(!d.is_set(DEFINE));
    }

    #[test]
    fn test_bind_writes_uniforms_and_texture() {
        let mut p = FrustumMaskPlugin::new().with_darken(DarkenPolicy::BLACK).with_depth_bias(0.001);
        let vp = mat4::scaling(Vec3::splat(2.0));
        p.set_view_projection(vp);
        p.set_depth_texture(Some(TextureId(3)));

        let mut b = block();
        p.bind_for_draw(&mut b);
        assert_eq!(b.get_mat4(U_VIEW_PROJECTION), Some(vp));
        assert_eq!(b.get_float(U_DARKEN_FACTOR), Some(0.0));
        assert_eq!(b.get_float(U_DEPTH_BIAS), Some(0.001));
        assert_eq!(b.texture(T_DEPTH), Some(TextureId(3)));
    }

    #[test]
    fn test_missing_depth_texture_still_binds_uniforms() {
        let p = FrustumMaskPlugin::new();
        let mut b = block();
        p.bind_for_draw(&mut b);
        p.bind_for_draw(&mut b);
        assert!(p.warned_missing_depth.get());
        assert_eq!(b.texture(T_DEPTH), None);
        assert_eq!(b.get_float(U_DEPTH_BIAS), Some(DEFAULT_DEPTH_BIAS));
    }

    #[test]
    fn test_warning_rearms_after_texture_set() {
        let mut p = FrustumMaskPlugin::new();
        let mut b = block();
        p.bind_for_draw(&mut b);
        p.set_depth_texture(Some(TextureId(1)));
        assert!(!p.warned_missing_depth.get());
    }

    #[test]
    fn test_negative_bias_is_clamped() {
        let p = FrustumMaskPlugin::new().with_depth_bias(-1.0);
        assert_eq!(p.depth_bias(), 0.0);
    }

    #[test]
    fn test_snippets_are_guarded() {
        let p = FrustumMaskPlugin::new();
        for point in InjectionPoint::ALL {
            let code = p.custom_code(point).unwrap();
            assert!(code.starts_with("#ifdef FRUSTUM_MASK"), "{:?}", point);
            assert!(code.trim_end().ends_with("#endif"), "{:?}", point);
        }
    }

    #[test]
    fn test_uniform_struct_matches_layout() {
        let expected = crate::UniformLayout::new(UNIFORMS).wgsl_struct("FrustumMaskUniforms");
        assert!(VERTEX_DEFINITIONS.contains(expected.trim_end()));
    }
}
