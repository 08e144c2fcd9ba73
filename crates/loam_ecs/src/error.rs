//! Error types for world operations

use thiserror::Error;

use crate::component::ComponentType;
use crate::entity::Entity;

/// Result type for world operations
pub type Result<T> = std::result::Result<T, WorldError>;

/// Errors raised by [`World`](crate::World)
#[derive(Debug, Error)]
pub enum WorldError {
    /// Entity is dead or was never spawned
    #[error("Entity {0} does not exist")]
    EntityNotFound(Entity),

    /// A value was stored under a key for a different Rust type
    #[error("Value of type '{actual}' cannot be stored as {expected}")]
    TypeMismatch {
        expected: ComponentType,
        actual: &'static str,
    },
}
