//! # Rendering System
//!
//! Instance data for the batched draw path and the per-frame protocol that
//! keeps it in sync with the scene.
//!
//! ## Architecture
//!
//! - **InstanceDataBuffer**: the packed per-instance and shared data
//! - **BatchManager**: slot allocation and draw submission (pluggable)
//! - **BatchSyncController**: batching lifecycle and per-frame writes

pub mod batch_manager;
pub mod batch_sync;
pub mod instance_buffer;
pub mod object_registry;

pub use batch_manager::{
    BaseInstanceRecord, BatchError, BatchManager, BatchResult, InstanceSink, SlotBatchManager,
};
pub use batch_sync::{BatchSyncController, FrameContext, SweepParams};
pub use instance_buffer::{
    InstanceBufferError, InstanceBufferLayout, InstanceBufferResult, InstanceDataBuffer,
    SharedHeader,
};
pub use object_registry::{BatchedMesh, ObjectRegistry};
