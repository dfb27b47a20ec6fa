//! # Batch Manager
//!
//! The seam between the sync controller and whatever owns the instanced
//! draw. A [`BatchManager`] hands out instance slots for meshes and, once
//! per frame, walks its live slots: it writes each slot's base record and
//! then hands control back through [`InstanceSink::instance_updated`] so the
//! extension attributes can be filled in.
//!
//! [`SlotBatchManager`] is the reference implementation: a fixed pool of
//! slots with free-list reuse and a 112-byte base record.

use crate::config::{BatchConfig, ShaderConfig};
use crate::foundation::collections::{FreeList, SecondaryMap};
use crate::render::instance_buffer::{InstanceBufferError, InstanceBufferResult};
use crate::scene::{NodeId, Scene};
use bytemuck::{Pod, Zeroable};

/// Result type for batch operations
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that can occur while driving a batch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// Instance buffer rejected a write or its construction
    #[error("Instance buffer error: {0}")]
    Buffer(#[from] InstanceBufferError),

    /// Batch manager was configured for a different base record size
    #[error("Base record layout mismatch: manager writes {manager} bytes, buffer holds {buffer}")]
    LayoutMismatch {
        /// Record size the manager writes
        manager: usize,
        /// Record size the buffer was built with
        buffer: usize,
    },
}

/// Receiver of per-instance writes during [`BatchManager::update`]
pub trait InstanceSink {
    /// Storage for one slot's base record
    fn base_record_mut(&mut self, slot: usize) -> InstanceBufferResult<&mut [u8]>;

    /// Called after `slot`'s base record has been written for `mesh`
    fn instance_updated(&mut self, slot: usize, mesh: NodeId) -> InstanceBufferResult<()>;
}

/// Owner of instance slots and the instanced draw
pub trait BatchManager {
    /// Try to give `mesh` an instance slot
    ///
    /// Returns `false` when the mesh cannot be batched, most often because
    /// every slot is taken. That is not an error.
    fn add_mesh(&mut self, scene: &Scene, mesh: NodeId) -> bool;

    /// Release `mesh`'s slot; unknown meshes are ignored
    fn remove_mesh(&mut self, mesh: NodeId);

    /// Write every live slot into `sink`
    fn update(&mut self, time: f32, scene: &Scene, sink: &mut dyn InstanceSink) -> BatchResult<()>;

    /// Slot currently held by `mesh`
    fn slot_of(&self, mesh: NodeId) -> Option<usize>;

    /// Number of occupied slots
    fn instance_count(&self) -> usize;

    /// Bytes per base record this manager writes
    fn base_record_bytes(&self) -> usize;
}

/// Per-instance record written by [`SlotBatchManager`]
///
/// Matches the shader's per-instance block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BaseInstanceRecord {
    /// Mesh world matrix, column major
    pub world_matrix: [[f32; 4]; 4],
    /// Material color and opacity
    pub color: [f32; 4],
    /// Texture offset (xy) and repeat (zw)
    pub uv_transform: [f32; 4],
    /// Texture atlas index and flags
    pub map_settings: [f32; 4],
}

impl Default for BaseInstanceRecord {
    fn default() -> Self {
        Self {
            world_matrix: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            color: [1.0; 4],
            uv_transform: [0.0, 0.0, 1.0, 1.0],
            map_settings: [0.0; 4],
        }
    }
}

/// Bytes per [`BaseInstanceRecord`]
pub const BASE_INSTANCE_RECORD_BYTES: usize = std::mem::size_of::<BaseInstanceRecord>();

/// Fixed-capacity batch manager with free-list slot reuse
#[derive(Debug)]
pub struct SlotBatchManager {
    slots: FreeList<NodeId>,
    slot_by_mesh: SecondaryMap<NodeId, usize>,
    shaders: ShaderConfig,
    frame_time: f32,
}

impl SlotBatchManager {
    /// Create a manager with `capacity` slots
    pub fn new(capacity: usize, shaders: ShaderConfig) -> Self {
        Self {
            slots: FreeList::with_capacity(capacity),
            slot_by_mesh: SecondaryMap::with_capacity(capacity),
            shaders,
            frame_time: 0.0,
        }
    }

    /// Create a manager sized by a batch configuration
    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.max_instances, config.shaders.clone())
    }

    /// Shader sources for the batched pipeline
    pub fn shaders(&self) -> &ShaderConfig {
        &self.shaders
    }

    /// Time passed to the most recent update
    pub fn frame_time(&self) -> f32 {
        self.frame_time
    }
}

impl BatchManager for SlotBatchManager {
    fn add_mesh(&mut self, scene: &Scene, mesh: NodeId) -> bool {
        let is_mesh = scene.node(mesh).and_then(|node| node.mesh()).is_some();
        if !is_mesh || self.slot_by_mesh.contains_key(mesh) {
            return false;
        }

        match self.slots.insert(mesh) {
            Some(slot) => {
                let _ = self.slot_by_mesh.insert(mesh, slot);
                true
            }
            None => {
                log::warn!("Instance batch full, {:?} left unbatched", mesh);
                false
            }
        }
    }

    fn remove_mesh(&mut self, mesh: NodeId) {
        if let Some(slot) = self.slot_by_mesh.remove(mesh) {
            let _ = self.slots.remove(slot);
        }
    }

    fn update(&mut self, time: f32, scene: &Scene, sink: &mut dyn InstanceSink) -> BatchResult<()> {
        self.frame_time = time;

        for (slot, mesh) in self.slots.iter() {
            let Some(world) = scene.world_matrix(*mesh) else {
                // Removed from the scene without being unbatched; the slot
                // stays reserved until remove_mesh.
                log::trace!("Skipping slot {} for missing mesh {:?}", slot, mesh);
                continue;
            };

            let record = BaseInstanceRecord {
                world_matrix: (*world).into(),
                ..BaseInstanceRecord::default()
            };
            let bytes = bytemuck::bytes_of(&record);
            let target = sink.base_record_mut(slot)?;
            if target.len() != bytes.len() {
                return Err(BatchError::LayoutMismatch {
                    manager: bytes.len(),
                    buffer: target.len(),
                });
            }
            target.copy_from_slice(bytes);

            sink.instance_updated(slot, *mesh)?;
        }
        Ok(())
    }

    fn slot_of(&self, mesh: NodeId) -> Option<usize> {
        self.slot_by_mesh.get(mesh).copied()
    }

    fn instance_count(&self) -> usize {
        self.slots.len()
    }

    fn base_record_bytes(&self) -> usize {
        BASE_INSTANCE_RECORD_BYTES
    }
}
