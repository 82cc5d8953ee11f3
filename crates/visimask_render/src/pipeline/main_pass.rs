//! Main scene pass
//!
//! Draws every render object with its material's current shader variant.
//! Variants are composed from `base.wgsl` plus the material's plugins and
//! compiled lazily; each [`PipelineKey`] is compiled at most once.

use std::collections::{HashMap, HashSet};

use visimask_mask::ShaderComposer;

use super::layouts::{FrameBinding, SceneLayouts, FIRST_PLUGIN_GROUP, FRAME_GROUP};
use super::types::FrameUniforms;
use crate::gpu_material::{BindContext, FallbackDepthTexture, PipelineKey, PluginLayoutCache};
use crate::mesh::Vertex;
use crate::renderable::RenderObject;
use crate::texture_bridge::TextureRegistry;

/// Base material shader with injection markers
pub const BASE_SHADER: &str = include_str!("../shaders/base.wgsl");

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Default clear color (Babylon-style blue-gray)
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.2, g: 0.2, b: 0.3, a: 1.0 };

/// Lit, masked scene rendering
pub struct MainPass {
    composer: ShaderComposer,
    color_format: wgpu::TextureFormat,
    frame: FrameBinding,
    plugin_layouts: PluginLayoutCache,
    fallback: FallbackDepthTexture,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    failed: HashSet<PipelineKey>,
    depth_texture: Option<wgpu::TextureView>,
    depth_size: (u32, u32),
    pub clear_color: wgpu::Color,
}

impl MainPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &SceneLayouts,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            composer: ShaderComposer::new(BASE_SHADER).with_plugin_groups(FIRST_PLUGIN_GROUP, 2),
            color_format,
            frame: FrameBinding::new(device, layouts, "Main"),
            plugin_layouts: PluginLayoutCache::new(),
            fallback: FallbackDepthTexture::new(device, queue),
            pipelines: HashMap::new(),
            failed: HashSet::new(),
            depth_texture: None,
            depth_size: (0, 0),
            clear_color: CLEAR_COLOR,
        }
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn update_frame(&self, queue: &wgpu::Queue, uniforms: &FrameUniforms) {
        self.frame.update(queue, uniforms);
    }

    /// Ensure depth texture exists and is the right size
    pub fn ensure_depth_texture(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.depth_texture.is_some() && self.depth_size == (width, height) {
            return;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Main Depth Texture"),
            size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        self.depth_texture = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.depth_size = (width, height);
    }

    /// Run draw-time hooks, upload plugin data and compile missing variants
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &SceneLayouts,
        registry: &TextureRegistry,
        objects: &mut [RenderObject],
    ) {
        for object in objects.iter_mut() {
            let mut ctx = BindContext {
                device,
                queue,
                registry,
                fallback: &self.fallback.view,
                layouts: &mut self.plugin_layouts,
            };
            object.material.prepare(&mut ctx);

            let Some(key) = object.material.pipeline_key() else {
                continue;
            };
            if self.pipelines.contains_key(key) || self.failed.contains(key) {
                continue;
            }

            match self.compile(device, layouts, object) {
                Some(pipeline) => {
                    log::info!("Compiled pipeline for '{}' variant '{}'", object.name, key.variant);
                    self.pipelines.insert(key.clone(), pipeline);
                }
                None => {
                    self.failed.insert(key.clone());
                }
            }
        }
    }

    fn compile(
        &mut self,
        device: &wgpu::Device,
        layouts: &SceneLayouts,
        object: &RenderObject,
    ) -> Option<wgpu::RenderPipeline> {
        let material = &object.material;
        let key = material.pipeline_key()?;

        let source = match self.composer.compose(material.material()) {
            Ok(source) => source,
            Err(e) => {
                log::error!("Failed to compose shader for '{}': {}", object.name, e);
                return None;
            }
        };

        for block in material.blocks() {
            self.plugin_layouts.get_or_create(device, block.texture_count());
        }
        let mut group_layouts: Vec<&wgpu::BindGroupLayout> = vec![&layouts.frame, &layouts.object];
        for block in material.blocks() {
            group_layouts.push(self.plugin_layouts.get(block.texture_count())?);
        }

        let label = format!("Main Pipeline [{}]", key.variant);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&label),
            bind_group_layouts: &group_layouts,
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        Some(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
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
                    format: self.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: key.cull_mode(),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
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
        }))
    }

    /// Draw all objects into `view`
    ///
    /// Objects whose variant failed to compile are skipped.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, objects: &[RenderObject]) {
        let Some(depth_view) = self.depth_texture.as_ref() else {
            log::warn!("Main pass has no depth texture; skipping frame");
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Main Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_bind_group(FRAME_GROUP, &self.frame.bind_group, &[]);
        for object in objects {
            let Some(pipeline) = object.material.pipeline_key().and_then(|key| self.pipelines.get(key)) else {
                continue;
            };
            pass.set_pipeline(pipeline);
            object.bind_object(&mut pass);
            if !object.material.bind(&mut pass, FIRST_PLUGIN_GROUP) {
                continue;
            }
            object.mesh.draw(&mut pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visimask_mask::{FrustumMaskPlugin, PluginMaterial, SquareMaskPlugin};

    #[test]
    fn test_base_shader_has_every_marker() {
        for point in visimask_mask::InjectionPoint::ALL {
            assert!(BASE_SHADER.contains(&format!("//#inject {}", point.marker())), "missing {}", point.marker());
        }
    }

    #[test]
    fn test_compose_with_both_masks() {
        let composer = ShaderComposer::new(BASE_SHADER).with_plugin_groups(FIRST_PLUGIN_GROUP, 2);
        let mut material = PluginMaterial::new("test")
            .with_plugin(FrustumMaskPlugin::new())
            .with_plugin(SquareMaskPlugin::new());
        material.refresh_variant();

        let source = composer.compose(&material).unwrap();
        assert!(source.contains("@group(2) @binding(0) var<uniform> frustum_mask"));
        assert!(source.contains("@group(3) @binding(0) var<uniform> square_mask"));
        assert!(source.contains("out.secondary_clip"));
        assert!(!source.contains('#'));
    }

    #[test]
    fn test_disabled_mask_compiles_out() {
        let composer = ShaderComposer::new(BASE_SHADER);
        let mut material = PluginMaterial::new("test").with_plugin(FrustumMaskPlugin::new().with_enabled(false));
        material.refresh_variant();

        let source = composer.compose(&material).unwrap();
        assert!(!source.contains("frustum_mask"));
        assert!(source.contains("fn fs_main"));
    }

    #[test]
    fn test_plain_material_is_base_shader() {
        let composer = ShaderComposer::new(BASE_SHADER);
        let mut material = PluginMaterial::new("sky");
        material.refresh_variant();
        let source = composer.compose(&material).unwrap();
        assert!(!source.contains("//#inject"));
        assert!(source.contains("var color = vec4<f32>(diffuse + specular, 1.0);"));
    }
}
