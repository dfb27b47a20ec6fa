//! Batched mesh registry
//!
//! Side table from batched mesh to its owning entity and instance slot.
//! Keys are generational scene handles, so the table never keeps a mesh
//! alive and never confuses a removed mesh with whatever replaced it.
//! Entries are only dropped explicitly; lookups check that both the mesh
//! and its owner still exist and treat anything stale as absent.

use crate::ecs::{EntityId, World};
use crate::foundation::collections::SecondaryMap;
use crate::scene::{NodeId, Scene};

/// What the registry knows about one batched mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchedMesh {
    /// Entity whose state drives the mesh's highlight, if any
    pub owner: Option<EntityId>,
    /// Slot assigned by the batch manager
    pub slot: Option<usize>,
}

/// Mesh to owner/slot association for batched meshes
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    entries: SecondaryMap<NodeId, BatchedMesh>,
}

impl ObjectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly batched mesh
    pub fn insert(&mut self, mesh: NodeId, owner: Option<EntityId>, slot: Option<usize>) {
        let _ = self.entries.insert(mesh, BatchedMesh { owner, slot });
    }

    /// Stop tracking a mesh
    pub fn remove(&mut self, mesh: NodeId) -> Option<BatchedMesh> {
        self.entries.remove(mesh)
    }

    /// Whether the mesh is tracked, regardless of liveness
    pub fn contains(&self, mesh: NodeId) -> bool {
        self.entries.contains_key(mesh)
    }

    /// Raw entry for a mesh
    pub fn get(&self, mesh: NodeId) -> Option<&BatchedMesh> {
        self.entries.get(mesh)
    }

    /// Record the slot the batch manager assigned
    pub fn assign_slot(&mut self, mesh: NodeId, slot: usize) {
        if let Some(entry) = self.entries.get_mut(mesh) {
            entry.slot = Some(slot);
        }
    }

    /// Last slot seen for a mesh
    pub fn slot_of(&self, mesh: NodeId) -> Option<usize> {
        self.entries.get(mesh)?.slot
    }

    /// Live owner of a live mesh
    pub fn resolve_owner(&self, mesh: NodeId, scene: &Scene, world: &World) -> Option<EntityId> {
        if !scene.contains(mesh) {
            return None;
        }
        self.entries
            .get(mesh)?
            .owner
            .filter(|owner| world.contains(*owner))
    }

    /// Tracked meshes that are no longer in the scene
    pub fn stale_meshes(&self, scene: &Scene) -> Vec<NodeId> {
        self.entries
            .keys()
            .filter(|mesh| !scene.contains(*mesh))
            .collect()
    }

    /// Number of tracked meshes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate tracked meshes
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &BatchedMesh)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MeshDescriptor;

    #[test]
    fn test_owner_resolution_requires_liveness() {
        let mut scene = Scene::new();
        let mut world = World::new();
        let root = scene.add_group("root", None);
        let mesh = scene.add_mesh("mesh", Some(root), MeshDescriptor::opaque());
        let entity = world.spawn(root);

        let mut registry = ObjectRegistry::new();
        registry.insert(mesh, Some(entity), Some(0));
        assert_eq!(registry.resolve_owner(mesh, &scene, &world), Some(entity));

        let _ = world.despawn(entity);
        assert_eq!(registry.resolve_owner(mesh, &scene, &world), None);
        assert!(registry.contains(mesh));
    }

    #[test]
    fn test_removed_mesh_is_stale_not_dangling() {
        let mut scene = Scene::new();
        let world = World::new();
        let mesh = scene.add_mesh("mesh", None, MeshDescriptor::opaque());

        let mut registry = ObjectRegistry::new();
        registry.insert(mesh, None, None);
        assert_eq!(registry.slot_of(mesh), None);
        registry.assign_slot(mesh, 3);
        assert_eq!(registry.slot_of(mesh), Some(3));

        let _ = scene.remove(mesh);
        let replacement = scene.add_mesh("replacement", None, MeshDescriptor::opaque());
        assert!(!registry.contains(replacement));
        assert_eq!(registry.resolve_owner(mesh, &scene, &world), None);
        assert_eq!(registry.stale_meshes(&scene), vec![mesh]);
    }
}
