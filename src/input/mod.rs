//! Input handling module
//!
//! Maps special keys to semantic actions. Movement and camera input live in
//! `visimask_input`.

mod input_mapper;

pub use input_mapper::{InputMapper, InputAction};
