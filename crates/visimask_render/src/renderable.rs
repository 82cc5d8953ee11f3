//! Renderable objects - bridges World/Entity to GPU buffers
//!
//! A [`RenderObject`] owns everything one entity needs to be drawn: its mesh
//! buffers, the object uniforms with the diffuse texture, and a
//! [`MaskedMaterial`] carrying the entity's plugins.

use visimask_core::{DirtyFlags, Entity, EntityKey, World};
use visimask_mask::PluginMaterial;

use crate::gpu_material::MaskedMaterial;
use crate::mesh::{GpuMesh, MeshData};
use crate::pipeline::layouts::{ObjectBinding, SceneLayouts, OBJECT_GROUP};
use crate::pipeline::types::ObjectUniforms;
use crate::texture_bridge::GpuTexture;

/// Diffuse textures an entity can use
pub struct DiffuseTextures<'a> {
    pub checkerboard: &'a GpuTexture,
    pub white: &'a GpuTexture,
}

impl<'a> DiffuseTextures<'a> {
    fn for_entity(&self, entity: &Entity) -> &'a GpuTexture {
        if entity.material.checkerboard {
            self.checkerboard
        } else {
            self.white
        }
    }
}

/// GPU state of one entity
pub struct RenderObject {
    pub key: EntityKey,
    pub name: String,
    pub mesh: GpuMesh,
    pub material: MaskedMaterial,
    /// Drawn into the secondary camera's depth target
    pub casts_depth: bool,
    object: ObjectBinding,
    uniforms: ObjectUniforms,
}

impl RenderObject {
    pub fn new(
        device: &wgpu::Device,
        layouts: &SceneLayouts,
        key: EntityKey,
        entity: &Entity,
        material: PluginMaterial,
        textures: &DiffuseTextures<'_>,
    ) -> Self {
        let name = entity.name.clone().unwrap_or_else(|| format!("{:?}", key));
        let mesh = GpuMesh::upload(device, &MeshData::from_template(&entity.mesh), &name);
        let uniforms = ObjectUniforms::new(&entity.transform, &entity.material);
        let diffuse = textures.for_entity(entity);
        let object = ObjectBinding::new(device, layouts, &uniforms, &diffuse.view, &diffuse.sampler, &name);
        let material = MaskedMaterial::new(device, material, entity.material.double_sided);

        Self {
            key,
            name,
            mesh,
            material,
            casts_depth: entity.material.masked,
            object,
            uniforms,
        }
    }

    pub fn uniforms(&self) -> &ObjectUniforms {
        &self.uniforms
    }

    /// Re-upload object uniforms if the entity's transform or material moved
    ///
    /// Does not clear the entity's dirty flags; the caller owns that.
    pub fn sync(&mut self, queue: &wgpu::Queue, entity: &Entity) -> bool {
        let flags = entity.dirty_flags();
        if !flags.intersects(DirtyFlags::TRANSFORM | DirtyFlags::MATERIAL) {
            return false;
        }
        if flags.contains(DirtyFlags::TRANSFORM) {
            self.uniforms.set_transform(&entity.transform);
        }
        if flags.contains(DirtyFlags::MATERIAL) {
            self.uniforms.set_material(&entity.material);
        }
        self.object.update(queue, &self.uniforms);
        true
    }

    pub fn bind_object(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(OBJECT_GROUP, &self.object.bind_group, &[]);
    }
}

/// Build render objects for every entity of a world, in key order
///
/// `make_material` decides which plugins each entity's material carries.
pub fn build_render_objects(
    device: &wgpu::Device,
    layouts: &SceneLayouts,
    world: &World,
    textures: &DiffuseTextures<'_>,
    mut make_material: impl FnMut(&Entity) -> PluginMaterial,
) -> Vec<RenderObject> {
    let objects: Vec<RenderObject> = world
        .iter()
        .map(|(key, entity)| RenderObject::new(device, layouts, key, entity, make_material(entity), textures))
        .collect();
    log::info!("Created {} render objects", objects.len());
    objects
}

/// Push dirty entity state into their render objects and clear the flags
pub fn sync_render_objects(queue: &wgpu::Queue, world: &mut World, objects: &mut [RenderObject]) -> usize {
    let mut updated = 0;
    for object in objects.iter_mut() {
        if let Some(entity) = world.get_entity(object.key) {
            if object.sync(queue, entity) {
                updated += 1;
            }
        }
    }
    world.clear_all_dirty();
    updated
}
