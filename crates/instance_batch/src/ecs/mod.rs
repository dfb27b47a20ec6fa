//! Entity-Component-System implementation
//!
//! A deliberately small ECS: entities own a scene object and a bag of
//! optional capabilities queried by type.

pub mod component;
pub mod components;
pub mod entity;
pub mod world;

pub use component::Component;
pub use entity::EntityId;
pub use world::World;
