//! Interaction state queries
//!
//! Rendering only reads interaction state. Hover and hold are tracked
//! elsewhere and exposed through [`InteractionQuery`] so tests can feed a
//! plain [`InteractionState`].

use crate::ecs::EntityId;
use crate::scene::NodeId;

/// Controller-backed pointer that can hover or hold an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractorSource {
    /// Left hand controller
    LeftHand,
    /// Right hand laser pointer
    RightRemote,
    /// Right hand controller
    RightHand,
}

/// Read-only view of what each interactor is doing
pub trait InteractionQuery {
    /// Entity under the interactor, if any
    fn hovered(&self, source: InteractorSource) -> Option<EntityId>;

    /// Entity grabbed by the interactor, if any
    fn held(&self, source: InteractorSource) -> Option<EntityId>;

    /// Scene object whose world position represents the interactor
    fn interactor_object(&self, source: InteractorSource) -> Option<NodeId>;

    /// Whether the interactor hovers or holds `entity`
    fn targets(&self, source: InteractorSource, entity: EntityId) -> bool {
        self.hovered(source) == Some(entity) || self.held(source) == Some(entity)
    }
}

/// State of one interactor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractorState {
    /// Scene object that follows the controller
    pub object: Option<NodeId>,
    /// Currently hovered entity
    pub hovered: Option<EntityId>,
    /// Currently held entity
    pub held: Option<EntityId>,
}

/// Plain-data implementation of [`InteractionQuery`]
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    /// Left hand controller state
    pub left_hand: InteractorState,
    /// Right remote state
    pub right_remote: InteractorState,
    /// Right hand controller state
    pub right_hand: InteractorState,
}

impl InteractionState {
    /// Create state with no interactors attached
    pub fn new() -> Self {
        Self::default()
    }

    /// State of one interactor
    pub fn source(&self, source: InteractorSource) -> &InteractorState {
        match source {
            InteractorSource::LeftHand => &self.left_hand,
            InteractorSource::RightRemote => &self.right_remote,
            InteractorSource::RightHand => &self.right_hand,
        }
    }

    /// Mutable state of one interactor
    pub fn source_mut(&mut self, source: InteractorSource) -> &mut InteractorState {
        match source {
            InteractorSource::LeftHand => &mut self.left_hand,
            InteractorSource::RightRemote => &mut self.right_remote,
            InteractorSource::RightHand => &mut self.right_hand,
        }
    }
}

impl InteractionQuery for InteractionState {
    fn hovered(&self, source: InteractorSource) -> Option<EntityId> {
        self.source(source).hovered
    }

    fn held(&self, source: InteractorSource) -> Option<EntityId> {
        self.source(source).held
    }

    fn interactor_object(&self, source: InteractorSource) -> Option<NodeId> {
        self.source(source).object
    }
}

/// Interactors assigned to the two highlight slots for one entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedInteractors {
    /// Slot one: left hand only
    pub one: Option<InteractorSource>,
    /// Slot two: right remote, else right hand
    pub two: Option<InteractorSource>,
}

/// Pick which interactors highlight `entity`
///
/// The two slots are independent; a left and right interactor on the same
/// entity fill both.
pub fn resolve_interactors<Q>(query: &Q, entity: EntityId) -> ResolvedInteractors
where
    Q: InteractionQuery + ?Sized,
{
    let one = query
        .targets(InteractorSource::LeftHand, entity)
        .then_some(InteractorSource::LeftHand);

    let two = [InteractorSource::RightRemote, InteractorSource::RightHand]
        .into_iter()
        .find(|source| query.targets(*source, entity));

    ResolvedInteractors { one, two }
}
