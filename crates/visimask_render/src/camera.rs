//! Cameras
//!
//! All projection matrices here use the OpenGL clip convention (NDC z in
//! [-1, 1]), which the mask math is written against. Rasterization goes through
//! [`CLIP_CORRECTION`] to map that range onto wgpu's [0, 1].

use visimask_input::OrbitControl;
use visimask_math::{mat4, Mat4, Vec3};

/// Remaps OpenGL clip z to wgpu clip z: z' = 0.5 z + 0.5 w
pub const CLIP_CORRECTION: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 0.5, 0.0],
    [0.0, 0.0, 0.5, 1.0],
];

/// Keeps the orbit away from the poles where look-at degenerates
const BETA_EPSILON: f32 = 0.01;

/// A fixed camera: eye, look-at point and lens
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraPose {
    pub fn new(eye: Vec3, target: Vec3, fov_y: f32, near: f32, far: f32) -> Self {
        Self { eye, target, up: Vec3::Y, fov_y, near, far }
    }

    pub fn view(&self) -> Mat4 {
        mat4::look_at(self.eye, self.target, self.up)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        mat4::perspective(self.fov_y, aspect, self.near, self.far)
    }

    /// OpenGL-convention view-projection (what the mask math consumes)
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        mat4::mul(self.projection(aspect), self.view())
    }

    /// View-projection for rasterizing with wgpu
    pub fn gpu_view_projection(&self, aspect: f32) -> Mat4 {
        mat4::mul(CLIP_CORRECTION, self.view_projection(aspect))
    }
}

/// Camera orbiting a target
///
/// Position is `target + r (cos α sin β, cos β, sin α sin β)`.
#[derive(Clone, Debug)]
pub struct ArcRotateCamera {
    /// Longitudinal angle (radians)
    pub alpha: f32,
    /// Latitudinal angle from +Y (radians)
    pub beta: f32,
    pub radius: f32,
    pub target: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    home: (f32, f32, f32, Vec3),
}

impl ArcRotateCamera {
    pub fn new(alpha: f32, beta: f32, radius: f32, target: Vec3) -> Self {
        let beta = clamp_beta(beta);
        let radius = radius.max(f32::EPSILON);
        Self {
            alpha,
            beta,
            radius,
            target,
            fov_y: 0.8,
            near: 0.1,
            far: 1000.0,
            home: (alpha, beta, radius, target),
        }
    }

    /// Camera at `eye` looking at `target`
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        let mut cam = Self::new(0.0, std::f32::consts::FRAC_PI_2, 1.0, target);
        cam.set_position(eye);
        cam.set_home();
        cam
    }

    pub fn with_lens(mut self, fov_y: f32, near: f32, far: f32) -> Self {
        self.fov_y = fov_y;
        self.near = near;
        self.far = far;
        self
    }

    /// Place the eye at `eye`, recomputing angles and radius around the target
    pub fn set_position(&mut self, eye: Vec3) {
        let d = eye - self.target;
        let radius = d.length();
        if radius <= f32::EPSILON {
            log::warn!("Camera position coincides with its target; ignoring");
            return;
        }
        self.radius = radius;
        self.alpha = d.z.atan2(d.x);
        self.beta = clamp_beta((d.y / radius).clamp(-1.0, 1.0).acos());
    }

    pub fn position(&self) -> Vec3 {
        let (sa, ca) = self.alpha.sin_cos();
        let (sb, cb) = self.beta.sin_cos();
        self.target + Vec3::new(ca * sb, cb, sa * sb) * self.radius
    }

    /// Remember the current orientation as the reset point
    pub fn set_home(&mut self) {
        self.home = (self.alpha, self.beta, self.radius, self.target);
    }

    pub fn reset(&mut self) {
        (self.alpha, self.beta, self.radius, self.target) = self.home;
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose::new(self.position(), self.target, self.fov_y, self.near, self.far)
    }
}

impl OrbitControl for ArcRotateCamera {
    fn rotate(&mut self, delta_alpha: f32, delta_beta: f32) {
        self.alpha += delta_alpha;
        self.beta = clamp_beta(self.beta + delta_beta);
    }

    fn radius(&self) -> f32 {
        self.radius
    }

    fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(f32::EPSILON);
    }
}

fn clamp_beta(beta: f32) -> f32 {
    beta.clamp(BETA_EPSILON, std::f32::consts::PI - BETA_EPSILON)
}
