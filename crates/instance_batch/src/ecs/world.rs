//! ECS World implementation

use super::{Component, EntityId};
use crate::foundation::collections::SlotMap;
use crate::scene::NodeId;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Per-entity record: the scene object it drives plus its components
struct EntityRecord {
    object: NodeId,
    components: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

/// ECS World containing all entities and components
#[derive(Default)]
pub struct World {
    entities: SlotMap<EntityId, EntityRecord>,
    frozen: bool,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity bound to a scene object
    pub fn spawn(&mut self, object: NodeId) -> EntityId {
        self.entities.insert(EntityRecord {
            object,
            components: HashMap::new(),
        })
    }

    /// Remove an entity and all of its components
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        self.entities.remove(entity).is_some()
    }

    /// Whether the entity is still alive
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(entity)
    }

    /// Scene object driven by this entity
    pub fn object(&self, entity: EntityId) -> Option<NodeId> {
        self.entities.get(entity).map(|record| record.object)
    }

    /// Add a component to an entity, replacing any previous one of that type
    pub fn insert_component<T: Component>(&mut self, entity: EntityId, component: T) -> bool {
        match self.entities.get_mut(entity) {
            Some(record) => {
                let _ = record.components.insert(TypeId::of::<T>(), Box::new(component));
                true
            }
            None => false,
        }
    }

    /// Remove a component from an entity
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        let boxed = self.entities.get_mut(entity)?.components.remove(&TypeId::of::<T>())?;
        boxed.downcast::<T>().ok().map(|component| *component)
    }

    /// Get a component from an entity
    pub fn component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.entities
            .get(entity)?
            .components
            .get(&TypeId::of::<T>())?
            .downcast_ref::<T>()
    }

    /// Get a mutable component from an entity
    pub fn component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.entities
            .get_mut(entity)?
            .components
            .get_mut(&TypeId::of::<T>())?
            .downcast_mut::<T>()
    }

    /// Whether an entity carries a component of type `T`
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.component::<T>(entity).is_some()
    }

    /// Scene-wide frozen state
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Set the scene-wide frozen state
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}
