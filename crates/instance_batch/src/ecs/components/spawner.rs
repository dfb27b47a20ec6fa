//! Spawner marker component

/// Marks an entity that spawns copies of an object when grabbed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuperSpawner;
