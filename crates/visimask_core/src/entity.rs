//! Entity, mesh template and material description
//!
//! An Entity is an object in the scene: transform, geometry recipe, material,
//! and optionally a collider and an animation.

use std::collections::HashSet;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use visimask_math::Vec3;
use visimask_physics::{Aabb, StaticCollider};

use crate::animation::Animation;
use crate::transform::Transform;

bitflags! {
    /// Flags indicating which parts of an entity changed since the last upload
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DirtyFlags: u8 {
        /// No changes
        const NONE = 0;
        /// Transform (position, rotation, scale) has changed
        const TRANSFORM = 1 << 0;
        /// Mesh has changed
        const MESH = 1 << 1;
        /// Material has changed
        const MATERIAL = 1 << 2;
        /// All flags set - entity needs full rebuild
        const ALL = Self::TRANSFORM.bits() | Self::MESH.bits() | Self::MATERIAL.bits();
    }
}

/// Serializable geometry recipe, in local space centered at the origin
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MeshTemplate {
    /// Cube with the given side length
    Box { size: f32 },
    /// UV sphere
    Sphere {
        diameter: f32,
        #[serde(default = "default_segments")]
        segments: u32,
    },
    /// Flat XZ rectangle facing +Y, UVs repeated `uv_scale` times
    Ground {
        width: f32,
        depth: f32,
        #[serde(default = "default_uv_scale")]
        uv_scale: f32,
    },
    /// Upright capsule with total `height`
    Capsule {
        height: f32,
        radius: f32,
        #[serde(default = "default_segments")]
        segments: u32,
    },
}

fn default_segments() -> u32 {
    32
}

fn default_uv_scale() -> f32 {
    1.0
}

/// Ground colliders extend this far below the visible surface
const GROUND_COLLIDER_DEPTH: f32 = 1.0;

impl MeshTemplate {
    pub fn cube(size: f32) -> Self {
        MeshTemplate::Box { size }
    }

    pub fn sphere(diameter: f32) -> Self {
        MeshTemplate::Sphere { diameter, segments: default_segments() }
    }

    pub fn ground(width: f32, depth: f32) -> Self {
        MeshTemplate::Ground { width, depth, uv_scale: default_uv_scale() }
    }

    pub fn capsule(height: f32, radius: f32) -> Self {
        MeshTemplate::Capsule { height, radius, segments: default_segments() }
    }

    /// World-space box collider for this mesh, if the shape has one
    ///
    /// Rotation is ignored; only boxes and grounds produce colliders.
    pub fn collider_bounds(&self, transform: &Transform) -> Option<Aabb> {
        let s = transform.scale.abs();
        let p = transform.position;
        match *self {
            MeshTemplate::Box { size } => Some(Aabb::from_center_half_extents(p, s * (size * 0.5))),
            MeshTemplate::Ground { width, depth, .. } => {
                let hx = width * 0.5 * s.x;
                let hz = depth * 0.5 * s.z;
                Some(Aabb::new(
                    Vec3::new(p.x - hx, p.y - GROUND_COLLIDER_DEPTH, p.z - hz),
                    Vec3::new(p.x + hx, p.y, p.z + hz),
                ))
            }
            MeshTemplate::Sphere { .. } | MeshTemplate::Capsule { .. } => None,
        }
    }
}

/// Visual properties of an entity
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    /// Diffuse color (RGB, 0.0-1.0)
    pub diffuse: [f32; 3],
    /// Specular color (RGB, 0.0-1.0)
    pub specular: [f32; 3],
    pub specular_power: f32,
    /// Sample the generated checkerboard texture
    pub checkerboard: bool,
    /// Disable backface culling (needed for inside-out skies)
    pub double_sided: bool,
    /// Attach the scene's mask plugins to this material
    pub masked: bool,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            diffuse: [1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0],
            specular_power: 32.0,
            checkerboard: false,
            double_sided: false,
            masked: true,
        }
    }
}

impl MaterialDesc {
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self { diffuse: [r, g, b], ..Self::default() }
    }

    pub fn checkerboard() -> Self {
        Self { checkerboard: true, ..Self::default() }
    }

    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }

    pub fn with_masked(mut self, masked: bool) -> Self {
        self.masked = masked;
        self
    }
}

/// An object in the scene
pub struct Entity {
    /// Optional name for this entity (for lookup)
    pub name: Option<String>,
    /// Tags for categorization (e.g., "obstacle", "player")
    pub tags: HashSet<String>,
    pub transform: Transform,
    pub mesh: MeshTemplate,
    pub material: MaterialDesc,
    /// Whether this entity blocks the player
    pub collidable: bool,
    pub animation: Option<Animation>,
    /// Transform before animation; animations are evaluated against it
    rest: Transform,
    dirty: DirtyFlags,
}

impl Entity {
    pub fn new(mesh: MeshTemplate, transform: Transform, material: MaterialDesc) -> Self {
        Self {
            name: None,
            tags: HashSet::new(),
            transform,
            mesh,
            material,
            collidable: false,
            animation: None,
            rest: transform,
            dirty: DirtyFlags::ALL, // New entities are dirty
        }
    }

    /// Set the name of this entity (for lookup)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a tag to this entity
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_collidable(mut self, collidable: bool) -> Self {
        self.collidable = collidable;
        self
    }

    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Check if this entity has a specific tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn rest_transform(&self) -> &Transform {
        &self.rest
    }

    /// Static collider for this entity, if it is collidable and has a box shape
    pub fn collider(&self) -> Option<StaticCollider> {
        if !self.collidable {
            return None;
        }
        if self.transform.is_rotated() {
            log::debug!(
                "Collider for {:?} ignores its rotation",
                self.name.as_deref().unwrap_or("<unnamed>")
            );
        }
        self.mesh.collider_bounds(&self.transform).map(StaticCollider::new)
    }

    // --- Dirty tracking methods ---

    #[inline]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    #[inline]
    pub fn dirty_flags(&self) -> DirtyFlags {
        self.dirty
    }

    #[inline]
    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = DirtyFlags::NONE;
    }

    /// Move the entity; the new position also becomes its rest position
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
        self.rest.position = position;
        self.mark_dirty(DirtyFlags::TRANSFORM);
    }

    pub fn set_material(&mut self, material: MaterialDesc) {
        self.material = material;
        self.mark_dirty(DirtyFlags::MATERIAL);
    }

    /// Apply the animation for time `t`; returns true if the transform moved
    pub fn animate(&mut self, t: f32) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };
        let next = animation.evaluate(&self.rest, t);
        if next == self.transform {
            return false;
        }
        self.transform = next;
        self.mark_dirty(DirtyFlags::TRANSFORM);
        true
    }
}

/// A serializable entity template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTemplate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub transform: Transform,
    pub mesh: MeshTemplate,
    #[serde(default)]
    pub material: MaterialDesc,
    #[serde(default)]
    pub collidable: bool,
    #[serde(default)]
    pub animation: Option<Animation>,
}

impl EntityTemplate {
    pub fn new(mesh: MeshTemplate, transform: Transform, material: MaterialDesc) -> Self {
        Self {
            name: None,
            tags: Vec::new(),
            transform,
            mesh,
            material,
            collidable: false,
            animation: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_collidable(mut self, collidable: bool) -> Self {
        self.collidable = collidable;
        self
    }

    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Convert this template to an Entity
    pub fn to_entity(&self) -> Entity {
        let mut entity = Entity::new(self.mesh, self.transform, self.material)
            .with_collidable(self.collidable);
        entity.animation = self.animation;
        entity.name = self.name.clone();
        entity.tags.extend(self.tags.iter().cloned());
        entity
    }
}
