//! Error types for descriptor operations

use loam_ecs::{Entity, WorldError};
use thiserror::Error;

/// Result type for descriptor operations
pub type Result<T> = std::result::Result<T, ReflectError>;

/// Errors that can occur when operating through a descriptor
#[derive(Debug, Error)]
pub enum ReflectError {
    /// `set`/`get` on an entity that lacks the component
    #[error("Entity {entity} has no '{component}' component")]
    ComponentMissing { component: String, entity: Entity },

    /// Value handed to a descriptor is not its component type
    #[error("'{component}' expected {expected}, got {actual}")]
    TypeMismatch {
        component: String,
        expected: String,
        actual: String,
    },

    /// Serialized value could not be decoded
    #[error("Malformed '{component}' data: {message}")]
    Malformed { component: String, message: String },

    /// Field value of the right kind that the component refused
    #[error("'{component}.{field}' rejected value {value}")]
    FieldRejected {
        component: String,
        field: String,
        value: String,
    },

    /// Field name not present on the descriptor
    #[error("'{component}' has no field '{field}'")]
    FieldNotFound { component: String, field: String },

    /// Descriptor outlived the module that defined its type
    #[error("Module providing '{0}' has been unloaded")]
    ModuleUnloaded(String),

    #[error(transparent)]
    World(#[from] WorldError),
}

impl ReflectError {
    pub fn component_missing(component: impl Into<String>, entity: Entity) -> Self {
        ReflectError::ComponentMissing {
            component: component.into(),
            entity,
        }
    }

    pub fn type_mismatch(
        component: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        ReflectError::TypeMismatch {
            component: component.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn malformed(component: impl Into<String>, message: impl ToString) -> Self {
        ReflectError::Malformed {
            component: component.into(),
            message: message.to_string(),
        }
    }

    /// Whether this is a decode failure rather than a lookup or state problem
    pub fn is_malformed(&self) -> bool {
        matches!(self, ReflectError::Malformed { .. })
    }
}
