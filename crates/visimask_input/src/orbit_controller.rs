//! Arc-rotate camera controller
//!
//! Controls:
//! - Left mouse drag: orbit around the target
//! - Mouse wheel: zoom in/out

use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Pixels per wheel "line" for touchpads that report pixel deltas
const PIXELS_PER_LINE: f32 = 40.0;

/// Accumulates mouse input and applies it to an orbiting camera
#[derive(Clone, Debug)]
pub struct ArcRotateController {
    dragging: bool,
    pending_dx: f32,
    pending_dy: f32,
    pending_scroll: f32,

    /// Radians per pixel of drag
    pub rotate_sensitivity: f32,
    /// Fraction of the radius per wheel line
    pub zoom_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for ArcRotateController {
    fn default() -> Self {
        Self::new()
    }
}

impl ArcRotateController {
    pub fn new() -> Self {
        Self {
            dragging: false,
            pending_dx: 0.0,
            pending_dy: 0.0,
            pending_scroll: 0.0,
            rotate_sensitivity: 0.005,
            zoom_speed: 0.1,
            min_radius: 1.0,
            max_radius: 100.0,
        }
    }

    /// Process mouse button input
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.dragging = state == ElementState::Pressed;
        }
    }

    /// Process raw mouse motion; ignored unless dragging
    pub fn process_mouse_motion(&mut self, delta_x: f64, delta_y: f64) {
        if self.dragging {
            self.pending_dx += delta_x as f32;
            self.pending_dy += delta_y as f32;
        }
    }

    /// Process wheel input; positive is "scroll up" (zoom in)
    pub fn process_scroll(&mut self, delta: MouseScrollDelta) {
        self.pending_scroll += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
        };
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Apply and clear accumulated input
    pub fn update<C: OrbitControl>(&mut self, camera: &mut C) {
        if self.pending_dx != 0.0 || self.pending_dy != 0.0 {
            // Dragging right swings the camera left around the target
            camera.rotate(
                -self.pending_dx * self.rotate_sensitivity,
                -self.pending_dy * self.rotate_sensitivity,
            );
        }

        if self.pending_scroll != 0.0 {
            let factor = (1.0 - self.pending_scroll * self.zoom_speed).max(0.1);
            let radius = (camera.radius() * factor).clamp(self.min_radius, self.max_radius);
            camera.set_radius(radius);
        }

        self.pending_dx = 0.0;
        self.pending_dy = 0.0;
        self.pending_scroll = 0.0;
    }

    /// Builder: set rotation sensitivity
    pub fn with_rotate_sensitivity(mut self, sensitivity: f32) -> Self {
        self.rotate_sensitivity = sensitivity;
        self
    }

    /// Builder: set zoom speed
    pub fn with_zoom_speed(mut self, speed: f32) -> Self {
        self.zoom_speed = speed;
        self
    }

    /// Builder: set radius limits
    pub fn with_radius_limits(mut self, min: f32, max: f32) -> Self {
        self.min_radius = min.min(max);
        self.max_radius = max.max(min);
        self
    }
}

/// Camera the controller can orbit
pub trait OrbitControl {
    /// Change the longitudinal (alpha) and latitudinal (beta) angles
    fn rotate(&mut self, delta_alpha: f32, delta_beta: f32);
    fn radius(&self) -> f32;
    fn set_radius(&mut self, radius: f32);
}
