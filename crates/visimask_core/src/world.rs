//! World container for entities

use slotmap::{new_key_type, SlotMap};

use crate::entity::{DirtyFlags, Entity};

new_key_type! {
    /// Key to an entity in the world
    ///
    /// Generational, so a key to a removed entity never aliases a newer one.
    pub struct EntityKey;
}

/// All entities of the running scene
#[derive(Default)]
pub struct World {
    entities: SlotMap<EntityKey, Entity>,
}

impl World {
    pub fn new() -> Self {
        Self { entities: SlotMap::with_key() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entities: SlotMap::with_capacity_and_key(capacity) }
    }

    /// Add an entity to the world, returning its key
    pub fn add_entity(&mut self, entity: Entity) -> EntityKey {
        self.entities.insert(entity)
    }

    pub fn remove_entity(&mut self, key: EntityKey) -> Option<Entity> {
        self.entities.remove(key)
    }

    pub fn get_entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    pub fn get_entity_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(key)
    }

    /// First entity with the given name
    pub fn get_by_name(&self, name: &str) -> Option<(EntityKey, &Entity)> {
        self.entities.iter().find(|(_, e)| e.name.as_deref() == Some(name))
    }

    /// Key of the first entity with the given name
    pub fn key_by_name(&self, name: &str) -> Option<EntityKey> {
        self.get_by_name(name).map(|(key, _)| key)
    }

    /// All entities carrying `tag`
    pub fn get_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = (EntityKey, &'a Entity)> + 'a {
        self.entities.iter().filter(move |(_, e)| e.has_tag(tag))
    }

    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityKey, &mut Entity)> {
        self.entities.iter_mut()
    }

    /// Evaluate every entity's animation at elapsed time `t`
    ///
    /// Returns the number of entities that moved.
    pub fn animate(&mut self, t: f32) -> usize {
        let mut moved = 0;
        for entity in self.entities.values_mut() {
            if entity.animate(t) {
                moved += 1;
            }
        }
        moved
    }

    // --- Dirty tracking ---

    pub fn has_dirty_entities(&self) -> bool {
        self.entities.values().any(|e| e.is_dirty())
    }

    /// Keys of entities with any of `flags` set
    pub fn dirty_entities(&self, flags: DirtyFlags) -> Vec<EntityKey> {
        self.entities
            .iter()
            .filter(|(_, e)| e.dirty_flags().intersects(flags))
            .map(|(key, _)| key)
            .collect()
    }

    pub fn clear_all_dirty(&mut self) {
        for entity in self.entities.values_mut() {
            entity.clear_dirty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Animation;
    use crate::entity::{MaterialDesc, MeshTemplate};
    use crate::transform::Transform;
    use visimask_math::Vec3;

    fn make_test_entity() -> Entity {
        Entity::new(MeshTemplate::cube(1.0), Transform::identity(), MaterialDesc::default())
    }

    #[test]
    fn test_world_new() {
        let world = World::new();
        assert!(world.is_empty());
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_removed_key_is_stale() {
        let mut world = World::new();
        let key = world.add_entity(make_test_entity());
        assert!(world.remove_entity(key).is_some());
        let newer = world.add_entity(make_test_entity());
        assert!(world.get_entity(key).is_none());
        assert!(world.get_entity(newer).is_some());
    }

    #[test]
    fn test_get_by_name_and_tag() {
        let mut world = World::new();
        world.add_entity(make_test_entity().with_name("floor").with_tag("static"));
        let cube = world.add_entity(make_test_entity().with_name("cube").with_tag("static"));
        assert_eq!(world.key_by_name("cube"), Some(cube));
        assert!(world.get_by_name("missing").is_none());
        assert_eq!(world.get_by_tag("static").count(), 2);
    }

    #[test]
    fn test_dirty_tracking() {
        let mut world = World::new();
        let key = world.add_entity(make_test_entity());
        assert!(world.has_dirty_entities());
        world.clear_all_dirty();
        assert!(!world.has_dirty_entities());

        world.get_entity_mut(key).unwrap().set_position(Vec3::Y);
        assert_eq!(world.dirty_entities(DirtyFlags::TRANSFORM), vec![key]);
        assert!(world.dirty_entities(DirtyFlags::MATERIAL).is_empty());
    }

    #[test]
    fn test_animate_counts_moved() {
        let mut world = World::new();
        world.add_entity(make_test_entity().with_animation(Animation::Spin { rate: Vec3::Y }));
        world.add_entity(make_test_entity());
        assert_eq!(world.animate(1.0), 1);
        // Same time again: nothing moves
        assert_eq!(world.animate(1.0), 0);
    }
}
