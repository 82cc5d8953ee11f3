//! Rendering pipeline components
//!
//! Per frame the passes run in this order: secondary depth, main scene,
//! then the optional posterize post-process.

pub mod depth_pass;
pub mod layouts;
pub mod main_pass;
pub mod post_process;
pub mod types;

// Re-export types
pub use types::{FrameUniforms, ObjectUniforms, PostUniforms, DEFAULT_LIGHT_DIRECTION, DEFAULT_LIGHT_INTENSITY};

// Re-export pipelines
pub use depth_pass::DepthPass;
pub use layouts::{FrameBinding, ObjectBinding, SceneLayouts, FIRST_PLUGIN_GROUP, FRAME_GROUP, OBJECT_GROUP};
pub use main_pass::{MainPass, BASE_SHADER, CLEAR_COLOR, DEPTH_FORMAT};
pub use post_process::{posterize_threshold, scaled_size, PostProcess, PostSettings};
