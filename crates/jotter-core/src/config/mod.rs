//! Client configuration file.
//!
//! `JotterConfig` is a small JSON document shared by every front end. Missing
//! files mean defaults; unknown fields are rejected so typos surface early.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// Config file name inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Where the note encryption key is kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    /// Owner-only key file next to the database
    #[default]
    File,
    /// Platform keychain / credential manager
    Keyring,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JotterConfig {
    /// Database file; the front end picks a default when unset
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub secret_backend: SecretBackend,
    /// `tracing` filter directive, e.g. `jotter=debug`
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl JotterConfig {
    /// Load from `path`, returning defaults when the file does not exist
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!("failed to parse {}: {error}", path.display()))
        })?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    fn normalize(&mut self) {
        self.log_filter = normalize_text_option(self.log_filter.take());
        self.database_path = self
            .database_path
            .take()
            .filter(|path| !path.as_os_str().is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_default() {
        let tmp = tempdir().unwrap();
        let config = JotterConfig::load_from_path(&tmp.path().join("nope.json")).unwrap();
        assert_eq!(config, JotterConfig::default());
        assert_eq!(config.secret_backend, SecretBackend::File);
    }

    #[test]
    fn roundtrip_normalizes_values() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("jotter").join(CONFIG_FILE_NAME);

        let config = JotterConfig {
            database_path: Some(PathBuf::from("/tmp/notes.db")),
            secret_backend: SecretBackend::Keyring,
            log_filter: Some("  ".to_string()),
        };
        config.save_to_path(&path).unwrap();

        let loaded = JotterConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.database_path, Some(PathBuf::from("/tmp/notes.db")));
        assert_eq!(loaded.secret_backend, SecretBackend::Keyring);
        assert_eq!(loaded.log_filter, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"database_pth": "/x"}"#).unwrap();

        let error = JotterConfig::load_from_path(&path).unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }
}
