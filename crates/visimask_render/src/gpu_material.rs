//! GPU side of plugin materials
//!
//! Every plugin of a [`PluginMaterial`] gets one [`GpuParameterBlock`]: a
//! uniform buffer plus a bind group holding that buffer at binding 0 and the
//! plugin's textures at bindings 1, 2, ... The bind group is rebuilt only when
//! the plugin binds different texture ids or the registry swaps a view.

use std::collections::HashMap;

use visimask_mask::depth::FAR_DEPTH;
use visimask_mask::{MaterialPlugin, ParameterBlock, PluginMaterial, ShaderParameterSink, TextureId};
use visimask_math::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::texture_bridge::TextureRegistry;

/// Format of plugin depth textures and of the fallback
pub const DEPTH_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Bind group layouts for plugin groups, one per texture count
#[derive(Default)]
pub struct PluginLayoutCache {
    layouts: HashMap<usize, wgpu::BindGroupLayout>,
}

impl PluginLayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, device: &wgpu::Device, texture_count: usize) -> &wgpu::BindGroupLayout {
        self.layouts.entry(texture_count).or_insert_with(|| {
            let entries = plugin_layout_entries(texture_count);
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("Plugin Layout ({} textures)", texture_count)),
                entries: &entries,
            })
        })
    }

    pub fn get(&self, texture_count: usize) -> Option<&wgpu::BindGroupLayout> {
        self.layouts.get(&texture_count)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

/// Uniform block at binding 0, then unfilterable 2D textures read with
/// `textureLoad`
pub fn plugin_layout_entries(texture_count: usize) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(texture_count + 1);
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    });
    for i in 0..texture_count {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: i as u32 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
    }
    entries
}

/// 1x1 depth texture holding the far value
///
/// Bound wherever a plugin has no texture, so an unbound depth slot reads as
/// "nothing in front".
pub struct FallbackDepthTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl FallbackDepthTexture {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let size = wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Fallback Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::bytes_of(&FAR_DEPTH),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Everything needed to (re)build plugin bind groups
pub struct BindContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub registry: &'a TextureRegistry,
    pub fallback: &'a wgpu::TextureView,
    pub layouts: &'a mut PluginLayoutCache,
}

/// A plugin's parameter block with its uniform buffer and bind group
pub struct GpuParameterBlock {
    block: ParameterBlock,
    buffer: wgpu::Buffer,
    bind_group: Option<wgpu::BindGroup>,
    bound_generation: u64,
    label: String,
}

impl GpuParameterBlock {
    pub fn new(device: &wgpu::Device, block: ParameterBlock, label: impl Into<String>) -> Self {
        let label = label.into();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Uniforms", label)),
            contents: block.bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self { block, buffer, bind_group: None, bound_generation: 0, label }
    }

    pub fn block(&self) -> &ParameterBlock {
        &self.block
    }

    pub fn texture_count(&self) -> usize {
        self.block.texture_slots().len()
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    /// Push changed uniforms and rebuild the bind group if its inputs moved
    pub fn upload(&mut self, ctx: &mut BindContext<'_>) {
        if self.block.take_dirty() {
            ctx.queue.write_buffer(&self.buffer, 0, self.block.bytes());
        }

        let textures_changed = self.block.take_textures_dirty();
        let stale = self.bound_generation != ctx.registry.generation();
        if !(textures_changed || stale || self.bind_group.is_none()) {
            return;
        }

        let registry = ctx.registry;
        let fallback = ctx.fallback;
        let views: Vec<&wgpu::TextureView> = self
            .block
            .textures()
            .iter()
            .zip(self.block.texture_slots())
            .map(|(id, slot)| resolve_view(registry, *id, slot.name, fallback))
            .collect();
        let texture_count = views.len();

        let mut entries = Vec::with_capacity(texture_count + 1);
        entries.push(wgpu::BindGroupEntry { binding: 0, resource: self.buffer.as_entire_binding() });
        for (i, view) in views.into_iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: i as u32 + 1,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }

        let layout = ctx.layouts.get_or_create(ctx.device, texture_count);
        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", self.label)),
            layout,
            entries: &entries,
        }));
        self.bound_generation = registry.generation();
        log::debug!("Rebuilt bind group for {}", self.label);
    }
}

fn resolve_view<'a>(
    registry: &'a TextureRegistry,
    id: Option<TextureId>,
    slot: &str,
    fallback: &'a wgpu::TextureView,
) -> &'a wgpu::TextureView {
    match id {
        Some(id) => registry.get(id).unwrap_or_else(|| {
            log::warn!("Texture {:?} for slot '{}' is not registered; using fallback", id, slot);
            fallback
        }),
        // The plugin itself reports unset textures
        None => fallback,
    }
}

impl ShaderParameterSink for GpuParameterBlock {
    fn set_float(&mut self, name: &str, value: f32) {
        self.block.set_float(name, value);
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.block.set_vec3(name, value);
    }

    fn set_mat4(&mut self, name: &str, value: &Mat4) {
        self.block.set_mat4(name, value);
    }

    fn set_texture(&mut self, name: &str, texture: Option<TextureId>) {
        self.block.set_texture(name, texture);
    }
}

/// Identifies one compiled pipeline
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    /// Plugin class names in order; they fix the bind group layout
    pub plugins: Vec<&'static str>,
    pub variant: String,
    pub double_sided: bool,
}

impl PipelineKey {
    /// Key for the material's current variant, if one has been computed
    pub fn for_material(material: &PluginMaterial, double_sided: bool) -> Option<Self> {
        let variant = material.variant_key()?.to_string();
        let plugins = material.plugins().iter().map(|p| p.class_name()).collect();
        Some(Self { plugins, variant, double_sided })
    }

    pub fn cull_mode(&self) -> Option<wgpu::Face> {
        if self.double_sided {
            None
        } else {
            Some(wgpu::Face::Back)
        }
    }
}

/// A [`PluginMaterial`] with GPU parameter blocks for its plugins
pub struct MaskedMaterial {
    material: PluginMaterial,
    blocks: Vec<GpuParameterBlock>,
    double_sided: bool,
    key: Option<PipelineKey>,
}

impl MaskedMaterial {
    pub fn new(device: &wgpu::Device, material: PluginMaterial, double_sided: bool) -> Self {
        let blocks = material
            .create_parameter_blocks()
            .into_iter()
            .zip(material.plugins())
            .map(|(block, plugin)| {
                let label = format!("{} {}", material.name(), plugin.class_name());
                GpuParameterBlock::new(device, block, label)
            })
            .collect();
        Self { material, blocks, double_sided, key: None }
    }

    pub fn material(&self) -> &PluginMaterial {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut PluginMaterial {
        &mut self.material
    }

    pub fn plugin<T: MaterialPlugin>(&self) -> Option<&T> {
        self.material.plugin::<T>()
    }

    pub fn plugin_mut<T: MaterialPlugin>(&mut self) -> Option<&mut T> {
        self.material.plugin_mut::<T>()
    }

    pub fn blocks(&self) -> &[GpuParameterBlock] {
        &self.blocks
    }

    pub fn double_sided(&self) -> bool {
        self.double_sided
    }

    /// Pipeline for the current variant; `None` before the first `prepare`
    pub fn pipeline_key(&self) -> Option<&PipelineKey> {
        self.key.as_ref()
    }

    /// Refresh the variant, run the draw-time hooks and upload the results
    ///
    /// Returns true when the shader variant changed and a pipeline lookup is
    /// needed.
    pub fn prepare(&mut self, ctx: &mut BindContext<'_>) -> bool {
        let changed = match self.material.refresh_variant() {
            Some(variant) => {
                log::debug!("Material '{}' needs variant '{}'", self.material.name(), variant);
                self.key = PipelineKey::for_material(&self.material, self.double_sided);
                true
            }
            None => false,
        };

        self.material.bind_for_draw(&mut self.blocks);
        for block in &mut self.blocks {
            block.upload(ctx);
        }
        changed
    }

    /// Bind every plugin group starting at `first_group`
    ///
    /// Returns false if some block has never been prepared.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, first_group: u32) -> bool {
        for (i, block) in self.blocks.iter().enumerate() {
            match block.bind_group() {
                Some(group) => pass.set_bind_group(first_group + i as u32, group, &[]),
                None => return false,
            }
        }
        true
    }
}
