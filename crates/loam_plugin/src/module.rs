//! Module boundaries
//!
//! A [`ModuleBoundary`] owns whatever keeps a plugin's code and tables in
//! memory. Dropping the boundary releases the module; nothing obtained from
//! it may be used afterwards.

use std::path::{Path, PathBuf};

use libloading::Library;
use loam_plugin_api::{ManifestFn, MANIFEST_SYMBOL};

use crate::error::{PluginError, Result};

/// A loaded plugin module with an explicit lifetime
pub trait ModuleBoundary: Send {
    /// Human-readable origin, used in logs and errors
    fn label(&self) -> &str;

    /// The module's manifest function. Only valid while `self` is alive.
    fn manifest_fn(&self) -> ManifestFn;
}

/// Plugin loaded from a shared library on disk
pub struct NativeModule {
    manifest_fn: ManifestFn,
    label: String,
    path: PathBuf,
    /// Keeps the code behind `manifest_fn` mapped
    _library: Library,
}

impl NativeModule {
    /// Load a shared library and resolve its manifest symbol
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PluginError::load_failure(path, "file not found"));
        }

        let library = unsafe {
            Library::new(path).map_err(|e| PluginError::load_failure(path, e.to_string()))?
        };

        let label = path.display().to_string();
        let symbol_name = format!("{}\0", MANIFEST_SYMBOL);
        let manifest_fn: ManifestFn = unsafe {
            *library
                .get::<ManifestFn>(symbol_name.as_bytes())
                .map_err(|_| PluginError::symbol_not_found(&label, MANIFEST_SYMBOL))?
        };

        log::debug!("Opened plugin library '{}'", label);

        Ok(Self {
            manifest_fn,
            label,
            path: path.to_path_buf(),
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModuleBoundary for NativeModule {
    fn label(&self) -> &str {
        &self.label
    }

    fn manifest_fn(&self) -> ManifestFn {
        self.manifest_fn
    }
}

impl Drop for NativeModule {
    fn drop(&mut self) {
        log::info!("Releasing plugin library '{}'", self.label);
    }
}

/// Plugin linked into the host binary.
///
/// Nothing is unmapped when it is dropped, but descriptors issued for it are
/// revoked exactly as for a [`NativeModule`].
pub struct StaticModule {
    label: String,
    manifest_fn: ManifestFn,
}

impl StaticModule {
    pub fn new(label: impl Into<String>, manifest_fn: ManifestFn) -> Self {
        Self {
            label: label.into(),
            manifest_fn,
        }
    }
}

impl ModuleBoundary for StaticModule {
    fn label(&self) -> &str {
        &self.label
    }

    fn manifest_fn(&self) -> ManifestFn {
        self.manifest_fn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = NativeModule::open(dir.path().join("absent.so")).err().unwrap();
        assert!(matches!(err, PluginError::LoadFailure { .. }));
    }

    #[test]
    fn test_not_a_library() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an object file").unwrap();
        let err = NativeModule::open(file.path()).err().unwrap();
        assert!(matches!(err, PluginError::LoadFailure { .. }));
    }
}
