//! Hoverable visuals component
//!
//! Caches the bounding sphere used to drive the hover sweep effect.

/// Component carrying the cached bounding sphere of a hoverable object
///
/// # Examples
/// ```
/// # use instance_batch::ecs::components::HoverableVisuals;
/// let visuals = HoverableVisuals::new(1.5);
/// assert_eq!(visuals.bounding_radius, 1.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverableVisuals {
    /// Bounding sphere radius in object space
    pub bounding_radius: f32,
}

impl HoverableVisuals {
    /// Create the component from an object-space radius
    pub fn new(bounding_radius: f32) -> Self {
        Self { bounding_radius }
    }
}
