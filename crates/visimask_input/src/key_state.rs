//! Pressed-key tracking and per-frame snapshots

use std::collections::HashSet;

use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// Which physical keys drive each movement direction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    pub forward: Vec<KeyCode>,
    pub back: Vec<KeyCode>,
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
}

impl Default for KeyBindings {
    /// WASD plus the arrow keys
    fn default() -> Self {
        Self {
            forward: vec![KeyCode::KeyW, KeyCode::ArrowUp],
            back: vec![KeyCode::KeyS, KeyCode::ArrowDown],
            left: vec![KeyCode::KeyA, KeyCode::ArrowLeft],
            right: vec![KeyCode::KeyD, KeyCode::ArrowRight],
        }
    }
}

impl KeyBindings {
    /// Whether `key` is bound to any direction
    pub fn is_bound(&self, key: KeyCode) -> bool {
        self.forward.contains(&key)
            || self.back.contains(&key)
            || self.left.contains(&key)
            || self.right.contains(&key)
    }
}

/// Directions held down at one frame boundary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl InputSnapshot {
    /// Nothing pressed
    pub const IDLE: Self = Self { forward: false, back: false, left: false, right: false };

    /// (forward, right) axes in -1..=1; opposite keys cancel
    pub fn axes(&self) -> (f32, f32) {
        let forward = (self.forward as i32 - self.back as i32) as f32;
        let right = (self.right as i32 - self.left as i32) as f32;
        (forward, right)
    }

    pub fn is_idle(&self) -> bool {
        self.axes() == (0.0, 0.0)
    }
}

/// Currently pressed keys, written by the event loop
#[derive(Clone, Debug, Default)]
pub struct KeyState {
    pressed: HashSet<KeyCode>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key event; returns true if the key changed state
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        match state {
            ElementState::Pressed => self.pressed.insert(key),
            ElementState::Released => self.pressed.remove(&key),
        }
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Forget every key, e.g. when the window loses focus
    pub fn clear(&mut self) {
        self.pressed.clear();
    }

    /// Directions pressed right now under `bindings`
    pub fn snapshot(&self, bindings: &KeyBindings) -> InputSnapshot {
        let any = |keys: &[KeyCode]| keys.iter().any(|k| self.pressed.contains(k));
        InputSnapshot {
            forward: any(&bindings.forward),
            back: any(&bindings.back),
            left: any(&bindings.left),
            right: any(&bindings.right),
        }
    }
}
