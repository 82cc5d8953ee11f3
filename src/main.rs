//! visimask - visibility masking demo
//!
//! Renders a scene whose materials are masked by what a secondary, orbiting
//! camera can see and by a square region around the player.

use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::WindowId,
};

use visimask::config::AppConfig;
use visimask::input::{InputAction, InputMapper};
use visimask::scene::load_scene;
use visimask::systems::{
    ActiveScene, MaskToggles, RenderError, RenderSystem, SimulationSystem, TitleStats, WindowSystem,
};
use visimask_core::{OrbitPath, Vec3};
use visimask_input::{ArcRotateController, KeyState};
use visimask_render::ArcRotateCamera;

/// Seconds between title updates
const STATS_INTERVAL: f32 = 0.5;

/// Frames counted since the last title update
struct FrameCounter {
    since: Instant,
    frames: u32,
}

impl FrameCounter {
    fn new() -> Self {
        Self { since: Instant::now(), frames: 0 }
    }

    /// Count a frame; returns the fps once per interval
    fn tick(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.since.elapsed().as_secs_f32();
        if elapsed < STATS_INTERVAL {
            return None;
        }
        let fps = self.frames as f32 / elapsed;
        self.since = Instant::now();
        self.frames = 0;
        Some(fps)
    }
}

/// Main application state
struct App {
    config: AppConfig,
    window: Option<WindowSystem>,
    render: Option<RenderSystem>,
    scene: ActiveScene,
    simulation: SimulationSystem,
    keys: KeyState,
    camera: ArcRotateCamera,
    controller: ArcRotateController,
    toggles: MaskToggles,
    counter: FrameCounter,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let fallback_orbit = OrbitPath::new(
            config.secondary.radius,
            config.secondary.height,
            config.secondary.angular_speed,
        );
        let scene = ActiveScene::new(load_scene(&config.scene).instantiate(), fallback_orbit);

        let eye = scene.camera_position.unwrap_or_else(|| Vec3::from(config.camera.position));
        let camera = ArcRotateCamera::looking_at(eye, Vec3::from(config.camera.target)).with_lens(
            config.camera.fov,
            config.camera.near,
            config.camera.far,
        );

        let controller = ArcRotateController::new()
            .with_rotate_sensitivity(config.input.rotate_sensitivity)
            .with_zoom_speed(config.input.zoom_speed)
            .with_radius_limits(config.input.min_radius, config.input.max_radius);

        log::info!("Loaded scene '{}' with {} entities", scene.name, scene.world.entity_count());

        Self {
            simulation: SimulationSystem::new(&config),
            toggles: MaskToggles::new(&config.mask),
            config,
            window: None,
            render: None,
            scene,
            keys: KeyState::new(),
            camera,
            controller,
            counter: FrameCounter::new(),
        }
    }

    fn handle_action(&mut self, action: InputAction, event_loop: &ActiveEventLoop) {
        match action {
            InputAction::Exit => event_loop.exit(),
            InputAction::ToggleMask => self.toggles.toggle_enabled(),
            InputAction::ToggleSquareStyle => self.toggles.toggle_square_style(),
            InputAction::TogglePostProcess => {
                if let Some(render) = &mut self.render {
                    render.toggle_post_process();
                }
            }
            InputAction::ToggleFullscreen => {
                if let Some(window) = &self.window {
                    window.toggle_fullscreen();
                }
            }
            InputAction::ResetCamera => {
                self.camera.reset();
                log::info!("Camera reset to starting position");
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let frame = self.simulation.update(&mut self.scene, &self.keys);
        self.controller.update(&mut self.camera);

        let Some(render) = &mut self.render else {
            return;
        };
        match render.render_frame(&mut self.scene, &frame, &self.camera.pose(), &self.toggles) {
            Ok(()) => {}
            Err(RenderError::SurfaceLost) => render.reconfigure(),
            Err(RenderError::OutOfMemory) => {
                log::error!("GPU out of memory; exiting");
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("{}", e),
        }

        if let (Some(window), Some(fps)) = (&self.window, self.counter.tick()) {
            if self.config.debug.show_stats {
                window.update_title(&TitleStats {
                    fps,
                    masks_enabled: self.toggles.enabled,
                    post_process: render.post_enabled(),
                });
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match WindowSystem::create(event_loop, &self.config.window) {
            Ok(window) => window,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };

        let mut render = match RenderSystem::new(window.window().clone(), &self.config) {
            Ok(render) => render,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };
        render.load_scene(&self.scene, &self.config.post);
        self.simulation.reset_clock();

        window.request_redraw();
        self.window = Some(window);
        self.render = Some(render);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(render) = &mut self.render {
                    render.resize(physical_size.width, physical_size.height);
                }
            }

            WindowEvent::Focused(false) => {
                // Keys released while unfocused never arrive
                self.keys.clear();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.repeat && event.state == ElementState::Pressed {
                        return;
                    }
                    if let Some(action) = InputMapper::map_keyboard(key, event.state) {
                        self.handle_action(action, event_loop);
                    }
                    self.keys.process_keyboard(key, event.state);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                self.controller.process_mouse_button(button, state);
            }

            WindowEvent::CursorLeft { .. } => {
                self.controller.process_mouse_button(winit::event::MouseButton::Left, ElementState::Released);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.controller.process_scroll(delta);
            }

            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);

                // Request next frame
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        if let winit::event::DeviceEvent::MouseMotion { delta } = event {
            self.controller.process_mouse_motion(delta.0, delta.1);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config first so it can pick the log level
    let loaded = AppConfig::load();
    let level = loaded
        .as_ref()
        .map(|c| c.debug.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });
    log::info!("Starting visimask");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
