//! Input mapping from raw events to semantic actions
//!
//! Maps special keys to high-level actions like ToggleMask, Exit, etc.
//! Movement keys (WASD, arrows) are NOT mapped here - they go to `KeyState`.
//! Mouse input goes straight to the arc-rotate controller.

use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// Actions triggered by special input (not movement)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Exit application (Escape)
    Exit,
    /// Flip the enable flag of the scene's masks (M key)
    ToggleMask,
    /// Switch the square mask between recolor and binary (B key)
    ToggleSquareStyle,
    /// Turn the posterize pass on or off (P key)
    TogglePostProcess,
    /// Toggle fullscreen mode (F key)
    ToggleFullscreen,
    /// Reset the main camera to its starting orbit (R key)
    ResetCamera,
}

/// Maps raw input events to semantic actions
pub struct InputMapper;

impl InputMapper {
    /// Map keyboard input to an action
    ///
    /// Returns `Some(action)` for special keys, `None` for movement keys
    pub fn map_keyboard(key: KeyCode, state: ElementState) -> Option<InputAction> {
        // Only handle key presses, not releases
        if state != ElementState::Pressed {
            return None;
        }

        match key {
            KeyCode::Escape => Some(InputAction::Exit),
            KeyCode::KeyM => Some(InputAction::ToggleMask),
            KeyCode::KeyB => Some(InputAction::ToggleSquareStyle),
            KeyCode::KeyP => Some(InputAction::TogglePostProcess),
            KeyCode::KeyF => Some(InputAction::ToggleFullscreen),
            KeyCode::KeyR => Some(InputAction::ResetCamera),
            _ => None,
        }
    }
}
