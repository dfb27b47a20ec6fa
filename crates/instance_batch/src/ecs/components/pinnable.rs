//! Pinnable component

/// Marks an entity that can be pinned in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pinnable {
    /// Whether the entity is currently pinned
    pub pinned: bool,
}

impl Pinnable {
    /// Create the component with an initial pin state
    pub fn new(pinned: bool) -> Self {
        Self { pinned }
    }
}
