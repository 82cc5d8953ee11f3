//! Raster to GPU texture bridge
//!
//! Rasters are uploaded as RGBA8 sRGB, sampled with nearest filtering and
//! clamped edges. Plugins never hold GPU objects; they refer to textures by
//! [`TextureId`] and the [`TextureRegistry`] resolves the id at bind time.

use std::collections::HashMap;

use visimask_mask::TextureId;
use visimask_texture::PreparedTexture;

/// Format every uploaded raster uses
pub const RASTER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// An uploaded raster
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

/// Uploads prepared rasters
pub struct GpuTextureBridge;

impl GpuTextureBridge {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, prepared: &PreparedTexture) -> GpuTexture {
        let size = wgpu::Extent3d {
            width: prepared.width,
            height: prepared.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&prepared.name),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: RASTER_FORMAT,
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
            &prepared.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(prepared.bytes_per_row()),
                rows_per_image: Some(prepared.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Self::nearest_sampler(device, &prepared.name);

        log::info!("Uploaded texture '{}' ({}x{})", prepared.name, prepared.width, prepared.height);

        GpuTexture { texture, view, sampler, width: prepared.width, height: prepared.height }
    }

    /// Single-color 1x1 texture, used when a material has no raster
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, name: &str, rgba: [u8; 4]) -> GpuTexture {
        let prepared = PreparedTexture { name: name.to_string(), width: 1, height: 1, pixels: rgba.to_vec() };
        Self::upload(device, queue, &prepared)
    }

    pub fn nearest_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        })
    }
}

/// Texture views by id
#[derive(Default)]
pub struct TextureRegistry {
    views: HashMap<TextureId, wgpu::TextureView>,
    next_id: u64,
    generation: u64,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view under a fresh id
    pub fn register(&mut self, view: wgpu::TextureView) -> TextureId {
        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.views.insert(id, view);
        id
    }

    /// Point an existing id at a new view (e.g. after a resize)
    ///
    /// Returns false if the id was never registered.
    pub fn replace(&mut self, id: TextureId, view: wgpu::TextureView) -> bool {
        match self.views.get_mut(&id) {
            Some(slot) => {
                *slot = view;
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: TextureId) -> Option<wgpu::TextureView> {
        let removed = self.views.remove(&id);
        if removed.is_some() {
            self.generation += 1;
        }
        removed
    }

    /// Bumped whenever an existing id changes meaning, so bind groups built
    /// against an older generation must be rebuilt
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.views.contains_key(&id)
    }

    pub fn get(&self, id: TextureId) -> Option<&wgpu::TextureView> {
        self.views.get(&id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
