//! Component trait and implementations

/// Marker trait for components
///
/// Components are optional capabilities attached to an entity and looked
/// up by type. A missing component is an ordinary answer, not an error.
pub trait Component: 'static + Send + Sync {}

impl Component for crate::ecs::components::HoverableVisuals {}
impl Component for crate::ecs::components::Pinnable {}
impl Component for crate::ecs::components::SuperSpawner {}
