//! Secondary camera depth pass
//!
//! Renders every depth-casting object from the secondary pose into an
//! R32Float target holding `ndc.z * 0.5 + 0.5`, cleared to the far value.
//! The target is registered in the [`TextureRegistry`] so the frustum plugin
//! can refer to it by id. The pass keeps its own depth attachment.

use visimask_mask::depth::FAR_DEPTH;
use visimask_mask::TextureId;

use super::layouts::{FrameBinding, SceneLayouts, FRAME_GROUP};
use super::main_pass::DEPTH_FORMAT;
use super::types::FrameUniforms;
use crate::camera::CameraPose;
use crate::gpu_material::DEPTH_TEXTURE_FORMAT;
use crate::mesh::Vertex;
use crate::renderable::RenderObject;
use crate::texture_bridge::TextureRegistry;

const DEPTH_SHADER: &str = include_str!("../shaders/depth.wgsl");

struct DepthTargets {
    color: wgpu::TextureView,
    attachment: wgpu::TextureView,
    size: (u32, u32),
}

/// Depth of the scene as seen by the secondary camera
pub struct DepthPass {
    pipeline: wgpu::RenderPipeline,
    frame: FrameBinding,
    targets: Option<DepthTargets>,
    texture_id: Option<TextureId>,
}

impl DepthPass {
    pub fn new(device: &wgpu::Device, layouts: &SceneLayouts) -> Self {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Depth Pipeline Layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.object],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Depth Shader"),
            source: wgpu::ShaderSource::Wgsl(DEPTH_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Depth Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: DEPTH_TEXTURE_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            // No culling: the nearest surface wins through the depth test
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            frame: FrameBinding::new(device, layouts, "Depth"),
            targets: None,
            texture_id: None,
        }
    }

    /// Id of the depth target in the registry, once created
    pub fn texture_id(&self) -> Option<TextureId> {
        self.texture_id
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.targets.as_ref().map(|t| t.size)
    }

    /// Create or resize the targets; the registry id stays stable
    pub fn ensure_targets(
        &mut self,
        device: &wgpu::Device,
        registry: &mut TextureRegistry,
        width: u32,
        height: u32,
    ) -> TextureId {
        let size = (width.max(1), height.max(1));
        if let (Some(targets), Some(id)) = (&self.targets, self.texture_id) {
            if targets.size == size {
                return id;
            }
        }

        let extent = wgpu::Extent3d { width: size.0, height: size.1, depth_or_array_layers: 1 };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Secondary Depth Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let attachment = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Secondary Depth Attachment"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        // One view for the attachment, one for plugins sampling it
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let sampled_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let id = match self.texture_id {
            Some(id) if registry.contains(id) => {
                registry.replace(id, sampled_view);
                id
            }
            _ => registry.register(sampled_view),
        };
        log::info!("Secondary depth target is {}x{} ({:?})", size.0, size.1, id);

        self.targets = Some(DepthTargets {
            color: color_view,
            attachment: attachment.create_view(&wgpu::TextureViewDescriptor::default()),
            size,
        });
        self.texture_id = Some(id);
        id
    }

    /// Upload the secondary camera; call with the same pose pushed into the
    /// frustum plugins this frame
    pub fn update_pose(&self, queue: &wgpu::Queue, pose: &CameraPose, aspect: f32) {
        self.frame.update(queue, &FrameUniforms::from_pose(pose, aspect));
    }

    /// Aspect ratio of the target, or 1.0 before it exists
    pub fn aspect_ratio(&self) -> f32 {
        self.size().map_or(1.0, |(w, h)| w as f32 / h as f32)
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, objects: &[RenderObject]) {
        let Some(targets) = self.targets.as_ref() else {
            log::warn!("Depth pass has no target; skipping");
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Secondary Depth Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &targets.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r: FAR_DEPTH as f64, g: 0.0, b: 0.0, a: 1.0 }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.attachment,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(FRAME_GROUP, &self.frame.bind_group, &[]);
        for object in objects.iter().filter(|o| o.casts_depth) {
            object.bind_object(&mut pass);
            object.mesh.draw(&mut pass);
        }
    }
}
