//! visimask application library
//!
//! Configuration, input mapping, built-in scenes and the per-frame systems
//! behind the `visimask` binary.

pub mod config;
pub mod input;
pub mod scene;
pub mod systems;
