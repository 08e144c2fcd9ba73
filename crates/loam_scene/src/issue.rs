//! Recoverable problems found while loading a document

use std::fmt;

use loam_core::Guid;

/// One problem that was skipped over during a load.
///
/// Entities are identified by the guid written in the document.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadIssue {
    /// No descriptor is registered under the component name
    UnknownComponent { entity: Guid, component: String },
    /// The component value did not decode or could not be applied
    MalformedComponent {
        entity: Guid,
        component: String,
        message: String,
    },
    /// The record produced no entity
    CreationFailed {
        index: usize,
        guid: Guid,
        reason: String,
    },
    /// `parentGuid` names no entity in the document
    DanglingParent { entity: Guid, parent: Guid },
    /// The hierarchy refused the parent link
    RejectedParent {
        entity: Guid,
        parent: Guid,
        reason: String,
    },
    /// An entity record was not valid JSON of the record shape
    MalformedRecord { index: usize, message: String },
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadIssue::UnknownComponent { entity, component } => {
                write!(f, "entity {}: unknown component '{}'", entity, component)
            }
            LoadIssue::MalformedComponent {
                entity,
                component,
                message,
            } => write!(f, "entity {}: component '{}' skipped: {}", entity, component, message),
            LoadIssue::CreationFailed { index, guid, reason } => {
                write!(f, "record #{} ({}): not created: {}", index, guid, reason)
            }
            LoadIssue::DanglingParent { entity, parent } => {
                write!(f, "entity {}: parent {} not found", entity, parent)
            }
            LoadIssue::RejectedParent {
                entity,
                parent,
                reason,
            } => write!(f, "entity {}: parent {} rejected: {}", entity, parent, reason),
            LoadIssue::MalformedRecord { index, message } => {
                write!(f, "record #{}: {}", index, message)
            }
        }
    }
}
