//! Application systems
//!
//! Modular systems extracted from main.rs for better organization and testability.

mod masks;
mod render;
mod simulation;
mod window;

pub use masks::{build_material, update_material, MaskToggles};
pub use render::{match_depth_target, post_enabled, post_settings, RenderError, RenderSystem};
pub use simulation::{ActiveScene, FrameState, Player, SimulationSystem, MAX_FRAME_TIME};
pub use window::{format_title, TitleStats, WindowError, WindowSystem};
