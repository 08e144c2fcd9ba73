//! Error types for plugin loading

use std::path::PathBuf;

use loam_core::Version;
use thiserror::Error;

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;

/// Reasons a plugin module failed to load
#[derive(Debug, Error)]
pub enum PluginError {
    /// File missing or not a loadable library
    #[error("Failed to load plugin '{path}': {message}")]
    LoadFailure { path: PathBuf, message: String },

    /// Library does not export the manifest function
    #[error("Symbol '{symbol}' not found in plugin '{module}'")]
    SymbolNotFound { module: String, symbol: String },

    /// Module was built against an ABI this host cannot serve
    #[error("Plugin '{module}' targets ABI {found}, host provides {expected}")]
    AbiMismatch {
        module: String,
        found: Version,
        expected: Version,
    },

    /// Export tables are structurally broken
    #[error("Plugin '{module}' has an invalid manifest: {message}")]
    InvalidManifest { module: String, message: String },
}

impl PluginError {
    pub fn load_failure(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PluginError::LoadFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn symbol_not_found(module: impl Into<String>, symbol: impl Into<String>) -> Self {
        PluginError::SymbolNotFound {
            module: module.into(),
            symbol: symbol.into(),
        }
    }

    pub fn invalid_manifest(module: impl Into<String>, message: impl Into<String>) -> Self {
        PluginError::InvalidManifest {
            module: module.into(),
            message: message.into(),
        }
    }
}
