//! Input handling
//!
//! Window events update [`KeyState`] as they arrive. Once per frame the
//! simulation takes an [`InputSnapshot`] from it and turns that into a planar
//! movement delta with [`MovementIntegrator`]. Mouse input drives the main
//! camera through [`ArcRotateController`].

mod key_state;
mod movement;
mod orbit_controller;

pub use key_state::{InputSnapshot, KeyBindings, KeyState};
pub use movement::{planar_direction, MovementIntegrator, DEFAULT_MOVE_SPEED};
pub use orbit_controller::{ArcRotateController, OrbitControl};
