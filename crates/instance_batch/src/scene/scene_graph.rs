//! Scene graph
//!
//! A parent/child hierarchy of transform nodes. Nodes live in a slot map so
//! a [`NodeId`] held elsewhere turns into "absent" once the node is removed,
//! instead of aliasing whatever reuses the slot.

use crate::ecs::EntityId;
use crate::foundation::collections::{new_key_type, SlotMap};
use crate::foundation::math::{Mat4, Transform};

new_key_type! {
    /// Handle to a node in a [`Scene`]
    pub struct NodeId;
}

/// Material/geometry facts that decide whether a mesh can be batched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshDescriptor {
    /// Mesh is deformed by a skeleton
    pub skinned: bool,
    /// Material is alpha blended
    pub transparent: bool,
}

impl MeshDescriptor {
    /// Plain opaque, unskinned mesh
    pub fn opaque() -> Self {
        Self::default()
    }

    /// Alpha-blended mesh
    pub fn transparent() -> Self {
        Self {
            transparent: true,
            ..Self::default()
        }
    }

    /// Skinned mesh
    pub fn skinned() -> Self {
        Self {
            skinned: true,
            ..Self::default()
        }
    }
}

/// What a node carries besides its transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Pure transform node
    Group,
    /// Renderable mesh
    Mesh(MeshDescriptor),
}

/// A single node in the scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Node name, used for exclusion filters
    pub name: String,
    /// Node payload
    pub kind: NodeKind,
    /// Transform relative to the parent
    pub local: Transform,
    world: Mat4,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    entity: Option<EntityId>,
    batched: bool,
}

impl SceneNode {
    fn new(name: impl Into<String>, kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            kind,
            local: Transform::identity(),
            world: Mat4::identity(),
            parent,
            children: Vec::new(),
            entity: None,
            batched: false,
        }
    }

    /// Mesh payload, if this node is a mesh
    pub fn mesh(&self) -> Option<&MeshDescriptor> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }

    /// World matrix as of the last [`Scene::update_world_matrices`]
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world
    }

    /// Parent node, `None` for roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Direct children
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Entity attached directly to this node
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    /// Whether the mesh is currently part of an instanced batch
    pub fn is_batched(&self) -> bool {
        self.batched
    }
}

/// Scene hierarchy
#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeId, SceneNode>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transform-only node
    pub fn add_group(&mut self, name: impl Into<String>, parent: Option<NodeId>) -> NodeId {
        self.insert(SceneNode::new(name, NodeKind::Group, parent))
    }

    /// Add a mesh node
    pub fn add_mesh(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
        mesh: MeshDescriptor,
    ) -> NodeId {
        self.insert(SceneNode::new(name, NodeKind::Mesh(mesh), parent))
    }

    fn insert(&mut self, node: SceneNode) -> NodeId {
        let parent = node.parent;
        let id = self.nodes.insert(node);
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(parent)) {
            parent.children.push(id);
        }
        id
    }

    /// Remove a node and its whole subtree
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes.get(id).map(|node| node.parent) else {
            return false;
        };
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(parent)) {
            parent.children.retain(|child| *child != id);
        }
        let mut subtree = Vec::new();
        self.traverse(id, |child, _| subtree.push(child));
        for child in subtree {
            let _ = self.nodes.remove(child);
        }
        true
    }

    /// Whether the node is still part of the scene
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Set a node's local transform
    ///
    /// World matrices are not touched until the next
    /// [`update_world_matrices`](Self::update_world_matrices).
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local = transform;
        }
    }

    /// Bind an entity to a node
    pub fn attach_entity(&mut self, id: NodeId, entity: EntityId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.entity = Some(entity);
        }
    }

    /// Record whether a mesh is currently batched
    pub fn set_batched(&mut self, id: NodeId, batched: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.batched = batched;
        }
    }

    /// World matrix of a node
    pub fn world_matrix(&self, id: NodeId) -> Option<&Mat4> {
        self.nodes.get(id).map(SceneNode::world_matrix)
    }

    /// Recompute world matrices for `root` and everything below it
    ///
    /// Always recomputes, the parent's current world matrix is the base.
    pub fn update_world_matrices(&mut self, root: NodeId) {
        let Some(node) = self.nodes.get(root) else {
            return;
        };
        let base = node
            .parent
            .and_then(|parent| self.nodes.get(parent))
            .map_or_else(Mat4::identity, |parent| parent.world);

        let mut stack = vec![(root, base)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            node.world = parent_world * node.local.to_matrix();
            let world = node.world;
            stack.extend(node.children.iter().map(|child| (*child, world)));
        }
    }

    /// Visit `root` and all descendants, parents before children
    pub fn traverse<F>(&self, root: NodeId, mut visit: F)
    where
        F: FnMut(NodeId, &SceneNode),
    {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            visit(id, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Nearest entity attached to `id` or one of its ancestors
    pub fn owning_entity(&self, id: NodeId) -> Option<EntityId> {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.nodes.get(id)) {
            if node.entity.is_some() {
                return node.entity;
            }
            current = node.parent;
        }
        None
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{translation_of, Vec3};
    use approx::assert_relative_eq;

    #[test]
    fn test_world_matrices_compose_down_the_tree() {
        let mut scene = Scene::new();
        let root = scene.add_group("root", None);
        let child = scene.add_mesh("child", Some(root), MeshDescriptor::opaque());
        scene.set_transform(root, Transform::from_position(Vec3::new(0.0, 5.0, 0.0)));
        scene.set_transform(child, Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));

        scene.update_world_matrices(root);

        let world = scene.world_matrix(child).unwrap();
        assert_relative_eq!(translation_of(world), Vec3::new(1.0, 5.0, 0.0));
    }

    #[test]
    fn test_traverse_is_pre_order() {
        let mut scene = Scene::new();
        let root = scene.add_group("root", None);
        let a = scene.add_group("a", Some(root));
        let _a1 = scene.add_mesh("a1", Some(a), MeshDescriptor::opaque());
        let _b = scene.add_mesh("b", Some(root), MeshDescriptor::opaque());

        let mut names = Vec::new();
        scene.traverse(root, |_, node| names.push(node.name.clone()));
        assert_eq!(names, vec!["root", "a", "a1", "b"]);
    }

    #[test]
    fn test_owning_entity_walks_up() {
        let mut scene = Scene::new();
        let mut world = crate::ecs::World::new();
        let root = scene.add_group("root", None);
        let mesh = scene.add_mesh("mesh", Some(root), MeshDescriptor::opaque());
        assert_eq!(scene.owning_entity(mesh), None);

        let entity = world.spawn(root);
        scene.attach_entity(root, entity);
        assert_eq!(scene.owning_entity(mesh), Some(entity));
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut scene = Scene::new();
        let root = scene.add_group("root", None);
        let branch = scene.add_group("branch", Some(root));
        let leaf = scene.add_mesh("leaf", Some(branch), MeshDescriptor::opaque());

        assert!(scene.remove(branch));
        assert!(!scene.contains(leaf));
        assert!(scene.node(root).unwrap().children().is_empty());
        assert_eq!(scene.len(), 1);
    }
}
