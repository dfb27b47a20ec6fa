//! Scene management system
//!
//! The transform hierarchy that batched meshes and interactors live in.

mod scene_graph;

pub use scene_graph::{MeshDescriptor, NodeId, NodeKind, Scene, SceneNode};
