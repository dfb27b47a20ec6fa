//! Input management system
//!
//! Hover/hold state of the tracked controllers, as seen by rendering.

pub mod interaction;

pub use interaction::{
    resolve_interactors, InteractionQuery, InteractionState, InteractorSource, InteractorState,
    ResolvedInteractors,
};
