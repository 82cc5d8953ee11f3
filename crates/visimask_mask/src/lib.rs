//! Visibility masking for rendered materials
//!
//! This crate holds the per-fragment masking logic and the plugin interface
//! that lets a rendering backend inject it into larger shader programs.
//!
//! ## Masking math (CPU reference, mirrored in WGSL)
//!
//! - [`frustum`] - inside-frustum and occlusion test against a secondary camera
//! - [`square`] - axis-aligned square region around a reference point
//! - [`darken`] - what happens to fragments that fail a mask
//! - [`depth`] - depth buffer sampling abstraction
//!
//! ## Plugin interface
//!
//! - [`MaterialPlugin`] - declares uniforms, textures, defines and code fragments
//! - [`ShaderParameterSink`] - where plugins write per-draw values
//! - [`ParameterBlock`] - CPU-side uniform block with WGSL layout rules
//! - [`PluginMaterial`] - ordered plugin set with shader-variant tracking
//! - [`ShaderComposer`] - injects plugin code and resolves `#ifdef` branches
//! - [`FrustumMaskPlugin`] / [`SquareMaskPlugin`] - the two masks

pub mod composer;
pub mod darken;
pub mod defines;
pub mod depth;
pub mod frustum;
pub mod frustum_plugin;
pub mod plugin;
pub mod square;
pub mod square_plugin;
pub mod uniforms;

pub use composer::{preprocess, ComposeError, ShaderComposer, PLUGIN_GROUP_TOKEN};
pub use darken::{DarkenPolicy, shade_fragment};
pub use defines::ShaderDefines;
pub use depth::{DepthBuffer, DepthSampler};
pub use frustum::{Visibility, DEFAULT_DEPTH_BIAS, MIN_CLIP_W};
pub use frustum_plugin::FrustumMaskPlugin;
pub use plugin::{InjectionPoint, MaterialPlugin, PluginMaterial, ShaderStage};
pub use square::{SquareMaskStyle, SquareRegion};
pub use square_plugin::{SquareMaskPlugin, DEFAULT_SQUARE_SIZE};
pub use uniforms::{
    ParameterBlock, ShaderParameterSink, TextureId, TextureSlot, UniformDecl, UniformKind,
    UniformLayout,
};
