//! ECS Components module
//!
//! Capabilities the batching layer reads when encoding per-instance data.

pub mod hoverable;
pub mod pinnable;
pub mod spawner;

pub use hoverable::HoverableVisuals;
pub use pinnable::Pinnable;
pub use spawner::SuperSpawner;
