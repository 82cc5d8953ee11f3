//! Rendering for the visimask demos
//!
//! ## Key Components
//!
//! - [`context::RenderContext`] - WGPU device, queue, and surface management
//! - [`camera::ArcRotateCamera`] / [`camera::CameraPose`] - Main and secondary cameras
//! - [`mesh`] - Box, sphere, ground and capsule generation
//! - [`texture_bridge`] - Raster upload and the texture registry plugins refer to
//! - [`gpu_material::MaskedMaterial`] - GPU side of a plugin material
//! - [`pipeline::DepthPass`] - Secondary camera depth into an R32Float target
//! - [`pipeline::MainPass`] - Lit, masked scene rendering with a variant cache
//! - [`pipeline::PostProcess`] - Posterize and luminance threshold
//! - [`renderable::RenderObject`] - Entity to GPU buffers

pub mod camera;
pub mod context;
pub mod gpu_material;
pub mod mesh;
pub mod pipeline;
pub mod renderable;
pub mod texture_bridge;

pub use camera::{ArcRotateCamera, CameraPose, CLIP_CORRECTION};
pub use context::{ContextError, RenderContext};
pub use gpu_material::{
    BindContext, FallbackDepthTexture, GpuParameterBlock, MaskedMaterial, PipelineKey, PluginLayoutCache,
};
pub use mesh::{GpuMesh, MeshData, Vertex};
pub use pipeline::{DepthPass, FrameUniforms, MainPass, ObjectUniforms, PostProcess, PostSettings, SceneLayouts};
pub use renderable::{build_render_objects, sync_render_objects, DiffuseTextures, RenderObject};
pub use texture_bridge::{GpuTexture, GpuTextureBridge, TextureRegistry};
