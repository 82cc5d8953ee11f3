//! Posterize post-process
//!
//! The scene is rendered into an offscreen target, posterized and
//! thresholded into a smaller target at `scale` of the window size, then
//! upscaled to the surface with nearest sampling for a blocky look.

use wgpu::util::DeviceExt;

use super::types::PostUniforms;
use crate::texture_bridge::GpuTextureBridge;

const POST_SHADER: &str = include_str!("../shaders/post.wgsl");

/// Luma weights used by the threshold
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Posterize parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostSettings {
    pub levels: f32,
    pub threshold: f32,
    /// Resolution of the posterized image relative to the window
    pub scale: f32,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self { levels: 4.0, threshold: 0.025, scale: 0.25 }
    }
}

/// CPU reference of the posterize shader
///
/// Each channel becomes `floor(c * levels) / levels`; the result is kept when
/// its luma exceeds `threshold` and replaced by black otherwise.
pub fn posterize_threshold(rgb: [f32; 3], levels: f32, threshold: f32) -> [f32; 3] {
    let levels = levels.max(1.0);
    let posterized = rgb.map(|c| (c * levels).floor() / levels);
    let gray: f32 = posterized.iter().zip(LUMA_WEIGHTS).map(|(c, w)| c * w).sum();
    if gray > threshold {
        posterized
    } else {
        [0.0; 3]
    }
}

/// Size of the low-resolution target, never zero
pub fn scaled_size(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let scale = if scale.is_finite() && scale > 0.0 { scale.min(1.0) } else { 1.0 };
    let w = ((width as f32 * scale).floor() as u32).max(1);
    let h = ((height as f32 * scale).floor() as u32).max(1);
    (w, h)
}

struct Target {
    view: wgpu::TextureView,
    size: (u32, u32),
}

struct Targets {
    scene: Target,
    low: Target,
    posterize_group: wgpu::BindGroup,
    blit_group: wgpu::BindGroup,
}

/// Posterize + nearest upscale
pub struct PostProcess {
    settings: PostSettings,
    format: wgpu::TextureFormat,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniforms: wgpu::Buffer,
    posterize: wgpu::RenderPipeline,
    blit: wgpu::RenderPipeline,
    targets: Option<Targets>,
}

impl PostProcess {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, settings: PostSettings) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Post Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Post Shader"),
            source: wgpu::ShaderSource::Wgsl(POST_SHADER.into()),
        });

        let posterize = fullscreen_pipeline(device, &pipeline_layout, &shader, "fs_posterize", format);
        let blit = fullscreen_pipeline(device, &pipeline_layout, &shader, "fs_blit", format);

        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Post Uniforms"),
            contents: bytemuck::bytes_of(&PostUniforms::new(settings.levels, settings.threshold)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            settings,
            format,
            layout,
            sampler: GpuTextureBridge::nearest_sampler(device, "Post Sampler"),
            uniforms,
            posterize,
            blit,
            targets: None,
        }
    }

    pub fn settings(&self) -> PostSettings {
        self.settings
    }

    /// Update levels and threshold; a new scale applies on the next resize
    pub fn set_settings(&mut self, queue: &wgpu::Queue, settings: PostSettings) {
        self.settings = settings;
        queue.write_buffer(
            &self.uniforms,
            0,
            bytemuck::bytes_of(&PostUniforms::new(settings.levels, settings.threshold)),
        );
    }

    /// Offscreen view the main pass should render into
    pub fn scene_view(&self) -> Option<&wgpu::TextureView> {
        self.targets.as_ref().map(|t| &t.scene.view)
    }

    pub fn low_resolution(&self) -> Option<(u32, u32)> {
        self.targets.as_ref().map(|t| t.low.size)
    }

    /// Create or resize the offscreen targets for a window of this size
    pub fn ensure_targets(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        let low_size = scaled_size(size.0, size.1, self.settings.scale);
        if let Some(targets) = &self.targets {
            if targets.scene.size == size && targets.low.size == low_size {
                return;
            }
        }

        let scene = self.create_target(device, "Post Scene Target", size);
        let low = self.create_target(device, "Post Low-Res Target", low_size);
        let posterize_group = self.bind_source(device, &scene.view, "Posterize Bind Group");
        let blit_group = self.bind_source(device, &low.view, "Blit Bind Group");
        log::debug!("Post targets {}x{} -> {}x{}", size.0, size.1, low_size.0, low_size.1);

        self.targets = Some(Targets { scene, low, posterize_group, blit_group });
    }

    fn create_target(&self, device: &wgpu::Device, label: &str, size: (u32, u32)) -> Target {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width: size.0, height: size.1, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Target { view, size }
    }

    fn bind_source(&self, device: &wgpu::Device, view: &wgpu::TextureView, label: &str) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                wgpu::BindGroupEntry { binding: 2, resource: self.uniforms.as_entire_binding() },
            ],
        })
    }

    /// Posterize the scene target and upscale it into `output`
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let Some(targets) = self.targets.as_ref() else {
            log::warn!("Post process has no targets; skipping");
            return;
        };
        fullscreen_pass(encoder, "Posterize Pass", &targets.low.view, &self.posterize, &targets.posterize_group);
        fullscreen_pass(encoder, "Blit Pass", output, &self.blit, &targets.blit_group);
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}
