//! Error types for scene documents

use std::path::PathBuf;

use thiserror::Error;

/// Result type for scene document operations
pub type Result<T> = std::result::Result<T, SceneError>;

/// Errors reading or writing whole scene documents.
///
/// Problems inside a document are reported as
/// [`LoadIssue`](crate::LoadIssue)s instead.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

impl SceneError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SceneError::Io {
            path: path.into(),
            source,
        }
    }
}
