//! # Instance Batch
//!
//! Packs per-object render state into one contiguous instance buffer for an
//! instanced draw, and keeps that buffer in step with the meshes that are
//! batched and unbatched from frame to frame.
//!
//! ## Features
//!
//! - **Instance Buffer**: fixed-capacity slots with typed views over one allocation
//! - **Batch Sync**: add/remove objects, per-frame header and attribute writes
//! - **Interaction Highlighting**: hover/hold state encoded per instance
//! - **Pluggable Batching**: any [`render::BatchManager`] can own the draw
//!
//! ## Quick Start
//!
//! ```rust
//! use instance_batch::prelude::*;
//!
//! let config = BatchConfig::default();
//! let manager = SlotBatchManager::from_config(&config);
//! let mut controller = BatchSyncController::new(&config, manager)?;
//!
//! let mut scene = Scene::new();
//! let world = World::new();
//! let interaction = InteractionState::new();
//!
//! let root = scene.add_group("crate", None);
//! let _ = scene.add_mesh("body", Some(root), MeshDescriptor::opaque());
//! assert_eq!(controller.add_object(&mut scene, root), 1);
//!
//! let frame = FrameContext::new(&scene, &world, &interaction);
//! controller.tick(0.016, &frame)?;
//! let upload: &[u8] = controller.buffer().as_bytes();
//! # let _ = upload;
//! # Ok::<(), BatchError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod ecs;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{BatchConfig, Config, ConfigError, ShaderConfig},
        ecs::{
            components::{HoverableVisuals, Pinnable, SuperSpawner},
            Component, EntityId, World,
        },
        foundation::math::{Mat4, Transform, Vec3},
        input::{InteractionQuery, InteractionState, InteractorSource},
        render::{
            BatchError, BatchManager, BatchSyncController, FrameContext, InstanceDataBuffer,
            SlotBatchManager,
        },
        scene::{MeshDescriptor, NodeId, Scene},
    };
}
