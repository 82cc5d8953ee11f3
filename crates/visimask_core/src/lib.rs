//! Core scene types for visimask
//!
//! - [`Transform`] - Position, Euler rotation, and scale
//! - [`Entity`] - An object with a mesh template, material description and animation
//! - [`World`] - Container for all entities
//! - [`EntityKey`] - Generational key to an entity in the world
//! - [`Scene`] - Loadable/saveable RON scene template
//! - [`OrbitPath`] / [`Animation`] - Motion as pure functions of elapsed time

mod animation;
mod entity;
mod scene;
mod transform;
mod world;

pub use animation::{Animation, OrbitPath, OrbitPose};
pub use entity::{DirtyFlags, Entity, EntityTemplate, MaterialDesc, MeshTemplate};
pub use scene::{MaskKind, Scene, SceneError, SceneInstance};
pub use transform::Transform;
pub use world::{EntityKey, World};

// Re-export commonly used types for convenience
pub use visimask_math::{Mat4, Vec3, Vec4};
pub use visimask_physics::{CollisionWorld, StaticCollider};
