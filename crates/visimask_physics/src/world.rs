//! Static collision world

use slotmap::{new_key_type, SlotMap};

use crate::collision::{capsule_vs_aabb, CollisionLayer, Contact};
use crate::shapes::{Aabb, Capsule};

new_key_type! {
    /// Key to a static collider in the collision world
    pub struct ColliderKey;
}

/// Immovable box the character collides with
#[derive(Clone, Debug, PartialEq)]
pub struct StaticCollider {
    pub aabb: Aabb,
    pub layer: CollisionLayer,
}

impl StaticCollider {
    pub fn new(aabb: Aabb) -> Self {
        Self { aabb, layer: CollisionLayer::STATIC }
    }

    pub fn with_layer(mut self, layer: CollisionLayer) -> Self {
        self.layer = layer;
        self
    }
}

/// All static colliders in a scene
#[derive(Default)]
pub struct CollisionWorld {
    colliders: SlotMap<ColliderKey, StaticCollider>,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self { colliders: SlotMap::with_key() }
    }

    pub fn add(&mut self, collider: StaticCollider) -> ColliderKey {
        self.colliders.insert(collider)
    }

    pub fn remove(&mut self, key: ColliderKey) -> Option<StaticCollider> {
        self.colliders.remove(key)
    }

    pub fn get(&self, key: ColliderKey) -> Option<&StaticCollider> {
        self.colliders.get(key)
    }

    pub fn get_mut(&mut self, key: ColliderKey) -> Option<&mut StaticCollider> {
        self.colliders.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn clear(&mut self) {
        self.colliders.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColliderKey, &StaticCollider)> {
        self.colliders.iter()
    }

    /// Overlaps between `capsule` and every collider whose layer intersects `mask`
    pub fn capsule_contacts(
        &self,
        capsule: &Capsule,
        mask: CollisionLayer,
    ) -> Vec<(ColliderKey, Contact)> {
        self.colliders
            .iter()
            .filter(|(_, c)| c.layer.intersects(mask))
            .filter_map(|(key, c)| capsule_vs_aabb(capsule, &c.aabb).map(|contact| (key, contact)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visimask_math::Vec3;

    fn pillar() -> StaticCollider {
        StaticCollider::new(Aabb::from_center_half_extents(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.5, 1.0, 0.5),
        ))
    }

    #[test]
    fn test_add_remove() {
        let mut world = CollisionWorld::new();
        assert!(world.is_empty());
        let key = world.add(pillar());
        assert_eq!(world.len(), 1);
        assert!(world.get(key).is_some());
        assert!(world.remove(key).is_some());
        assert!(world.get(key).is_none());
        assert!(world.remove(key).is_none());
    }

    #[test]
    fn test_contacts_found() {
        let mut world = CollisionWorld::new();
        let key = world.add(pillar());
        let cap = Capsule::new(Vec3::new(0.8, 1.0, 0.0), 0.5, 0.5);
        let contacts = world.capsule_contacts(&cap, CollisionLayer::ALL);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].0, key);
        assert_eq!(contacts[0].1.normal, Vec3::X);
    }

    #[test]
    fn test_mask_filters_layers() {
        let mut world = CollisionWorld::new();
        world.add(pillar().with_layer(CollisionLayer::DECORATION));
        let cap = Capsule::new(Vec3::new(0.8, 1.0, 0.0), 0.5, 0.5);
        assert!(world.capsule_contacts(&cap, CollisionLayer::STATIC).is_empty());
        assert_eq!(world.capsule_contacts(&cap, CollisionLayer::ALL).len(), 1);
    }
}
