//! # loam_ecs - Entity Component System storage
//!
//! A small ECS world that the reflection and scene layers operate on.
//!
//! ## Key Concepts
//!
//! - **Entity**: generational identifier, stale handles are detected
//! - **Component**: plain value data, keyed by [`ComponentType`]
//! - **ComponentType**: either a compile-time Rust type or a runtime
//!   [`DynamicTypeId`] handed out for plugin-defined types
//! - **Hierarchy**: [`Parent`]/[`Children`] relation, edited through
//!   [`HierarchyCommands`] which rejects cycles
//!
//! ## Example
//!
//! ```ignore
//! use loam_ecs::prelude::*;
//!
//! let mut world = World::new();
//! let root = world.spawn();
//! let child = world.spawn();
//! world.insert(child, Position::new(10.0, 5.0))?;
//! HierarchyCommands::new(&mut world).set_parent(child, root)?;
//! ```

pub mod component;
pub mod components;
pub mod entity;
pub mod error;
pub mod hierarchy;
pub mod hierarchy_commands;
pub mod world;

pub use component::{BoxedComponent, Component, ComponentType, ComponentValue, DynamicTypeId};
pub use components::{
    BlendMode, BoxCollider, CameraFollow, EntityGuid, EntityName, Position, Rotation, Scale,
    SpriteRenderer, Velocity,
};
pub use entity::{Entity, EntityAllocator};
pub use error::{Result, WorldError};
pub use hierarchy::{Children, HierarchyError, Parent};
pub use hierarchy_commands::HierarchyCommands;
pub use world::World;

/// Prelude for common imports
pub mod prelude {
    pub use crate::component::{BoxedComponent, Component, ComponentType, ComponentValue};
    pub use crate::components::*;
    pub use crate::entity::Entity;
    pub use crate::hierarchy::{Children, Parent};
    pub use crate::hierarchy_commands::HierarchyCommands;
    pub use crate::world::World;
}
