//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`VM_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;

use visimask_input::DEFAULT_MOVE_SPEED;
use visimask_mask::{SquareMaskStyle, DEFAULT_DEPTH_BIAS, DEFAULT_SQUARE_SIZE};
use visimask_texture::{CheckerboardConfig, UploadOptions};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    /// Main (user-controlled) camera
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub input: InputConfig,
    /// Mask plugin parameters
    #[serde(default)]
    pub mask: MaskConfig,
    /// Secondary (masking) camera
    #[serde(default)]
    pub secondary: SecondaryCameraConfig,
    /// Checkerboard texture
    #[serde(default)]
    pub texture: TextureConfig,
    /// Posterize post-process
    #[serde(default)]
    pub post: PostConfig,
    #[serde(default)]
    pub rendering: RenderingConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`VM_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Optional user overrides
        if user_path.exists() {
            log::info!("Loading user config from {}", user_path.display());
            figment = figment.merge(Toml::file(&user_path));
        }

        // VM_WINDOW__TITLE -> window.title
        figment = figment.merge(Env::prefixed("VM_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "visimask".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Main camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Eye position, unless the scene sets one
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [5.0, 5.0, 5.0],
            target: [0.0, 0.0, 0.0],
            fov: 0.8,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Player speed in units per second
    pub move_speed: f32,
    /// Orbit radians per pixel of mouse drag
    pub rotate_sensitivity: f32,
    /// Fraction of the orbit radius per wheel line
    pub zoom_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            move_speed: DEFAULT_MOVE_SPEED,
            rotate_sensitivity: 0.005,
            zoom_speed: 0.1,
            min_radius: 1.0,
            max_radius: 100.0,
        }
    }
}

/// Mask plugin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Brightness kept by fragments the secondary camera cannot see (0 = black)
    pub darken_factor: f32,
    /// Occlusion comparison tolerance
    pub depth_bias: f32,
    /// Half extent of the square region around the player
    pub square_size: f32,
    pub square_style: SquareMaskStyle,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            darken_factor: 0.05,
            depth_bias: DEFAULT_DEPTH_BIAS,
            square_size: DEFAULT_SQUARE_SIZE,
            square_style: SquareMaskStyle::Recolor,
        }
    }
}

/// Secondary camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryCameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Width and height of the depth target
    pub depth_resolution: u32,
    /// Orbit used when the scene does not define one
    pub radius: f32,
    pub height: f32,
    /// Radians per second
    pub angular_speed: f32,
}

impl Default for SecondaryCameraConfig {
    fn default() -> Self {
        Self {
            fov: 0.8,
            near: 0.1,
            far: 100.0,
            depth_resolution: 1024,
            radius: 10.0,
            height: 5.0,
            angular_speed: 0.1,
        }
    }
}

impl SecondaryCameraConfig {
    /// Size of the secondary depth target in pixels
    pub fn depth_target_size(&self) -> (u32, u32) {
        let side = self.depth_resolution.max(1);
        (side, side)
    }

    /// Aspect ratio of the depth target
    pub fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.depth_target_size();
        width as f32 / height as f32
    }
}

/// Checkerboard texture configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub checkerboard: CheckerboardConfig,
    pub upload: UploadOptions,
}

/// Post-process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    /// Force the posterize pass on or off; the scene decides when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    pub levels: f32,
    pub threshold: f32,
    /// Resolution of the posterize target relative to the window
    pub scale: f32,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            levels: 4.0,
            threshold: 0.025,
            scale: 0.25,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Background color (RGB)
    pub clear_color: [f32; 3],
    /// Hemispheric light direction (towards the sky)
    pub light_direction: [f32; 3],
    pub light_intensity: f32,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.2, 0.2, 0.3],
            light_direction: [0.0, 1.0, 0.0],
            light_intensity: 0.7,
        }
    }
}

/// Scene selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Scene name; `<scenes_dir>/<name>.ron` wins over the built-in of that name
    pub name: String,
    pub scenes_dir: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: "playground".to_string(),
            scenes_dir: "scenes".to_string(),
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Used when `RUST_LOG` is not set
    pub log_level: String,
    /// Show FPS and toggles in the window title
    pub show_stats: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_stats: true,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
