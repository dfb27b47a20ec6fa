//! Entity implementation

use crate::foundation::collections::new_key_type;

new_key_type! {
    /// Entity identifier
    ///
    /// Generational: once an entity is despawned every copy of its id
    /// resolves to nothing, even if the slot is reused.
    pub struct EntityId;
}
