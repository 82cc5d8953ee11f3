//! GPU rendering system
//!
//! Manages GPU rendering including:
//! - Render context and surface
//! - Render objects for the active scene
//! - Frame ordering: uniforms → secondary depth → main pass → post → present

use std::sync::Arc;
use winit::window::Window;

use visimask_core::Vec3;
use visimask_render::{
    build_render_objects, sync_render_objects, CameraPose, ContextError, DepthPass, DiffuseTextures,
    FrameUniforms, GpuTexture, GpuTextureBridge, MainPass, PostProcess, PostSettings, RenderContext,
    RenderObject, SceneLayouts, TextureRegistry,
};
use visimask_texture::{generate_checkerboard, prepare_for_upload, TextureError};

use super::masks::{build_material, update_material, MaskToggles};
use super::simulation::{ActiveScene, FrameState};
use crate::config::{AppConfig, MaskConfig, PostConfig, RenderingConfig};

/// Render error types
#[derive(Debug)]
pub enum RenderError {
    /// Surface was lost (window resized, minimized, etc.)
    SurfaceLost,
    /// GPU out of memory
    OutOfMemory,
    /// Device or surface setup failed
    Context(ContextError),
    /// The checkerboard could not be generated
    Texture(TextureError),
    /// Other surface error
    Other(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::SurfaceLost => write!(f, "Surface lost"),
            RenderError::OutOfMemory => write!(f, "Out of memory"),
            RenderError::Context(e) => write!(f, "Render setup failed: {}", e),
            RenderError::Texture(e) => write!(f, "Texture generation failed: {}", e),
            RenderError::Other(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Context(e) => Some(e),
            RenderError::Texture(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ContextError> for RenderError {
    fn from(e: ContextError) -> Self {
        RenderError::Context(e)
    }
}

impl From<TextureError> for RenderError {
    fn from(e: TextureError) -> Self {
        RenderError::Texture(e)
    }
}

/// Post settings from config
pub fn post_settings(config: &PostConfig) -> PostSettings {
    PostSettings { levels: config.levels, threshold: config.threshold, scale: config.scale }
}

/// Whether the posterize pass starts enabled; config overrides the scene
pub fn post_enabled(config: &PostConfig, scene_default: bool) -> bool {
    config.enabled.unwrap_or(scene_default)
}

/// `frame` with its secondary view-projection built for a depth target of `aspect`
pub fn match_depth_target(frame: &FrameState, aspect: f32) -> FrameState {
    if frame.secondary_aspect == aspect {
        *frame
    } else {
        frame.with_secondary_aspect(aspect)
    }
}

fn wgpu_color(rgb: [f32; 3]) -> wgpu::Color {
    wgpu::Color { r: rgb[0] as f64, g: rgb[1] as f64, b: rgb[2] as f64, a: 1.0 }
}

/// Manages GPU rendering
pub struct RenderSystem {
    context: RenderContext,
    layouts: SceneLayouts,
    main_pass: MainPass,
    depth_pass: DepthPass,
    post: PostProcess,
    registry: TextureRegistry,
    checkerboard: GpuTexture,
    white: GpuTexture,
    objects: Vec<RenderObject>,
    rendering: RenderingConfig,
    mask_config: MaskConfig,
    depth_target: (u32, u32),
    uses_frustum: bool,
    post_enabled: bool,
}

impl RenderSystem {
    /// Create render system from window and config
    pub fn new(window: Arc<Window>, config: &AppConfig) -> Result<Self, RenderError> {
        let context = pollster::block_on(RenderContext::with_vsync(window, config.window.vsync))?;
        let device = &context.device;
        let queue = &context.queue;

        let checkerboard_image = generate_checkerboard(&config.texture.checkerboard)?;
        let checkerboard =
            GpuTextureBridge::upload(device, queue, &prepare_for_upload(&checkerboard_image, &config.texture.upload));
        let white = GpuTextureBridge::solid(device, queue, "White", [255, 255, 255, 255]);

        let layouts = SceneLayouts::new(device);
        let mut main_pass = MainPass::new(device, queue, &layouts, context.format());
        main_pass.clear_color = wgpu_color(config.rendering.clear_color);
        main_pass.ensure_depth_texture(device, context.size.width, context.size.height);

        let depth_pass = DepthPass::new(device, &layouts);

        let mut post = PostProcess::new(device, context.format(), post_settings(&config.post));
        post.ensure_targets(device, context.size.width, context.size.height);

        Ok(Self {
            context,
            layouts,
            main_pass,
            depth_pass,
            post,
            registry: TextureRegistry::new(),
            checkerboard,
            white,
            objects: Vec::new(),
            rendering: config.rendering.clone(),
            mask_config: config.mask.clone(),
            depth_target: config.secondary.depth_target_size(),
            uses_frustum: false,
            post_enabled: post_enabled(&config.post, false),
        })
    }

    /// Build render objects for a newly loaded scene
    pub fn load_scene(&mut self, scene: &ActiveScene, post: &PostConfig) {
        let textures = DiffuseTextures { checkerboard: &self.checkerboard, white: &self.white };
        let masks = scene.masks.clone();
        let mask_config = &self.mask_config;
        self.objects = build_render_objects(&self.context.device, &self.layouts, &scene.world, &textures, |entity| {
            build_material(entity, &masks, mask_config)
        });
        self.uses_frustum = scene.uses_mask(visimask_core::MaskKind::Frustum);
        self.post_enabled = post_enabled(post, scene.post_process);
        log::info!(
            "Scene '{}' ready: {} objects, secondary depth {}, post process {}",
            scene.name,
            self.objects.len(),
            if self.uses_frustum { "on" } else { "off" },
            if self.post_enabled { "on" } else { "off" }
        );
    }

    pub fn post_enabled(&self) -> bool {
        self.post_enabled
    }

    pub fn toggle_post_process(&mut self) {
        self.post_enabled = !self.post_enabled;
        log::info!("Post process {}", if self.post_enabled { "enabled" } else { "disabled" });
    }

    /// Handle window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(winit::dpi::PhysicalSize::new(width, height));
        let size = self.context.size;
        self.main_pass.ensure_depth_texture(&self.context.device, size.width, size.height);
        self.post.ensure_targets(&self.context.device, size.width, size.height);
    }

    /// Reconfigure the surface at its current size
    pub fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    /// Render a single frame
    ///
    /// `camera` is the main camera; the secondary pose comes from `frame`.
    pub fn render_frame(
        &mut self,
        scene: &mut ActiveScene,
        frame: &FrameState,
        camera: &CameraPose,
        toggles: &MaskToggles,
    ) -> Result<(), RenderError> {
        let device = &self.context.device;
        let queue = &self.context.queue;

        // 1. Entity uniforms
        sync_render_objects(queue, &mut scene.world, &mut self.objects);

        // 2. Secondary camera: plugins and the depth pass share one pose and aspect
        let (frame, depth_texture) = if self.uses_frustum {
            let (width, height) = self.depth_target;
            let id = self.depth_pass.ensure_targets(device, &mut self.registry, width, height);
            let frame = match_depth_target(frame, self.depth_pass.aspect_ratio());
            self.depth_pass.update_pose(queue, &frame.secondary_pose, frame.secondary_aspect);
            (frame, Some(id))
        } else {
            (*frame, None)
        };

        // 3. Plugin uniforms, then variants and bind groups
        for object in self.objects.iter_mut() {
            update_material(object.material.material_mut(), &frame, depth_texture, toggles);
        }
        let light = Vec3::from(self.rendering.light_direction);
        self.main_pass.update_frame(
            queue,
            &FrameUniforms::from_pose(camera, self.context.aspect_ratio()).with_light(light, self.rendering.light_intensity),
        );
        self.main_pass.prepare(device, queue, &self.layouts, &self.registry, &mut self.objects);

        // Get surface texture
        let output = match self.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                return Err(RenderError::SurfaceLost)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Other(format!("{:?}", e))),
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        // 4. Secondary depth
        if self.uses_frustum {
            self.depth_pass.render(&mut encoder, &self.objects);
        }

        // 5. Main pass, 6. post
        match self.post.scene_view().filter(|_| self.post_enabled) {
            Some(scene_view) => {
                self.main_pass.render(&mut encoder, scene_view, &self.objects);
                self.post.render(&mut encoder, &view);
            }
            None => self.main_pass.render(&mut encoder, &view, &self.objects),
        }

        // Submit
        queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Get current surface size
    pub fn size(&self) -> (u32, u32) {
        (self.context.size.width, self.context.size.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.context.aspect_ratio()
    }

    pub fn pipeline_count(&self) -> usize {
        self.main_pass.pipeline_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_display() {
        assert_eq!(format!("{}", RenderError::SurfaceLost), "Surface lost");
        assert_eq!(format!("{}", RenderError::OutOfMemory), "Out of memory");
        assert_eq!(
            format!("{}", RenderError::Other("test".to_string())),
            "Render error: test"
        );
        assert_eq!(
            format!("{}", RenderError::Context(ContextError::NoAdapter)),
            "Render setup failed: No suitable GPU adapter found"
        );
    }

    #[test]
    fn test_depth_target_aspect_reaches_plugins() {
        use crate::scene::SceneBuilder;
        use crate::systems::simulation::SimulationSystem;
        use visimask_core::OrbitPath;
        use visimask_input::InputSnapshot;

        let config = AppConfig::default();
        let mut scene = ActiveScene::new(SceneBuilder::playground().instantiate(), OrbitPath::default());
        let frame = SimulationSystem::new(&config).step(&mut scene, InputSnapshot::IDLE, 0.1);

        let square = match_depth_target(&frame, config.secondary.aspect_ratio());
        assert_eq!(square.secondary_view_projection, frame.secondary_view_projection);

        let wide = match_depth_target(&frame, 2.0);
        assert_eq!(wide.secondary_aspect, 2.0);
        assert_eq!(wide.secondary_view_projection, frame.secondary_pose.view_projection(2.0));
    }

    #[test]
    fn test_post_settings_from_config() {
        let settings = post_settings(&PostConfig::default());
        assert_eq!(settings, PostSettings::default());
    }

    #[test]
    fn test_post_enabled_config_wins() {
        let mut config = PostConfig::default();
        assert!(post_enabled(&config, true));
        assert!(!post_enabled(&config, false));

        config.enabled = Some(false);
        assert!(!post_enabled(&config, true));
        config.enabled = Some(true);
        assert!(post_enabled(&config, false));
    }
}
