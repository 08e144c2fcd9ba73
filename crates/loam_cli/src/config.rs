//! Tool configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Command-line flags (`--plugin`)
//! 2. Environment variables: `LOAM_PLUGIN`, `LOAM_LOG`
//! 3. Config file given with `--config`, else `./loam.toml` if present
//! 4. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! plugin = "target/debug/libdemo_plugin.so"
//! log_level = "debug"
//! pretty = true
//! identity = "preserve"  # preserve, regenerate
//! ```

use std::path::{Path, PathBuf};

use loam_scene::IdentityMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "loam.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings shared by every subcommand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoamConfig {
    /// Plugin module loaded before running a command
    pub plugin: Option<PathBuf>,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Pretty-print written scene documents
    pub pretty: bool,
    /// Guid handling for `resave`
    pub identity: IdentityMode,
    /// File the settings came from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for LoamConfig {
    fn default() -> Self {
        Self {
            plugin: None,
            log_level: "info".to_string(),
            pretty: true,
            identity: IdentityMode::Preserve,
            config_path: None,
        }
    }
}

impl LoamConfig {
    /// Load from the explicit file, or `./loam.toml`, then apply the
    /// environment. A missing `./loam.toml` is not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load_from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Override settings from environment lookups
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(plugin) = lookup("LOAM_PLUGIN").filter(|p| !p.is_empty()) {
            self.plugin = Some(PathBuf::from(plugin));
        }
        if let Some(level) = lookup("LOAM_LOG").filter(|l| !l.is_empty()) {
            self.log_level = level;
        }
    }

    /// One-line description for the startup log
    pub fn summary(&self) -> String {
        format!(
            "config: {} | plugin: {} | identity: {} | pretty: {}",
            self.config_path
                .as_ref()
                .map_or_else(|| "defaults".to_string(), |p| p.display().to_string()),
            self.plugin
                .as_ref()
                .map_or_else(|| "none".to_string(), |p| p.display().to_string()),
            self.identity,
            self.pretty
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = LoamConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(config.pretty);
        assert_eq!(config.identity, IdentityMode::Preserve);
        assert!(config.plugin.is_none());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loam.toml");
        std::fs::write(&path, "identity = \"regenerate\"\npretty = false\n").unwrap();

        let config = LoamConfig::load(Some(&path)).unwrap();
        assert_eq!(config.identity, IdentityMode::Regenerate);
        assert!(!config.pretty);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "identity = \"sideways\"").unwrap();
        assert!(matches!(
            LoamConfig::load_from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            LoamConfig::load_from_file(&dir.path().join("absent.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            [("LOAM_PLUGIN", "/tmp/libgame.so"), ("LOAM_LOG", "trace")].into();
        let mut config = LoamConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.plugin, Some(PathBuf::from("/tmp/libgame.so")));
        assert_eq!(config.log_level, "trace");

        let mut untouched = LoamConfig::default();
        untouched.apply_env(|_| Some(String::new()));
        assert_eq!(untouched, LoamConfig::default());
    }
}
