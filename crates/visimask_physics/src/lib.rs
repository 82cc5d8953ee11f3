//! Collision for the controllable capsule
//!
//! This crate provides just enough physics for keyboard-driven movement:
//! - Collision shapes (AABBs, vertical capsules)
//! - Capsule vs AABB contact generation with layer filtering
//! - A world of static colliders
//! - Move-and-slide character movement

pub mod character;
pub mod collision;
pub mod shapes;
pub mod world;

// Re-export commonly used types
pub use character::{CharacterController, MoveResult, DEFAULT_MAX_ITERATIONS};
pub use collision::{capsule_vs_aabb, sphere_vs_aabb, CollisionLayer, Contact};
pub use shapes::{Aabb, Capsule};
pub use world::{ColliderKey, CollisionWorld, StaticCollider};
