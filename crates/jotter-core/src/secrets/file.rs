//! File-backed secret store used where no platform keychain is available.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use super::{normalize_secret, reject_empty, SecretStore};
use crate::error::{Error, Result};

/// Secrets kept in a JSON map readable only by the owning user
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    guard: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let raw = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|error| {
            Error::KeyUnavailable(format!(
                "failed to parse secret file {}: {error}",
                self.path.display()
            ))
        })
    }

    /// Replace the file atomically with an owner-only copy
    fn store(&self, secrets: &BTreeMap<String, String>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let serialized = serde_json::to_string_pretty(secrets)?;
        let mut staged = NamedTempFile::new_in(dir)?;
        restrict_permissions(staged.path())?;
        staged.write_all(serialized.as_bytes())?;
        staged.as_file().sync_all()?;
        staged
            .persist(&self.path)
            .map_err(|error| Error::Io(error.error))?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| Error::KeyUnavailable("secret file lock poisoned".to_string()))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

impl SecretStore for FileSecretStore {
    fn read_secret(&self, name: &str) -> Result<Option<String>> {
        let _guard = self.lock()?;
        Ok(self
            .load()?
            .get(name)
            .and_then(|value| normalize_secret(value)))
    }

    fn write_secret(&self, name: &str, value: &str) -> Result<()> {
        let value = reject_empty(value)?;
        let _guard = self.lock()?;
        let mut secrets = self.load()?;
        secrets.insert(name.to_string(), value.to_string());
        self.store(&secrets)
    }

    fn delete_secret(&self, name: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut secrets = self.load()?;
        if secrets.remove(name).is_some() {
            self.store(&secrets)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn secrets_survive_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("keys").join("secrets.json");

        FileSecretStore::new(&path)
            .write_secret("note_encryption_key", "abc")
            .unwrap();

        let reopened = FileSecretStore::new(&path);
        assert_eq!(
            reopened.read_secret("note_encryption_key").unwrap().as_deref(),
            Some("abc")
        );

        reopened.delete_secret("note_encryption_key").unwrap();
        reopened.delete_secret("note_encryption_key").unwrap();
        assert_eq!(reopened.read_secret("note_encryption_key").unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn secret_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let store = FileSecretStore::new(tmp.path().join("secrets.json"));
        store.write_secret("k", "v").unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_replaces_readable_file_and_leaves_no_staging_files() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let path = tmp.path().join("secrets.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileSecretStore::new(&path);
        store.write_secret("k", "v").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.read_secret("k").unwrap().as_deref(), Some("v"));

        let entries = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn corrupt_file_is_key_unavailable() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("secrets.json");
        std::fs::write(&path, "{not json").unwrap();

        let error = FileSecretStore::new(&path).read_secret("k").unwrap_err();
        assert!(matches!(error, Error::KeyUnavailable(_)));
    }
}
