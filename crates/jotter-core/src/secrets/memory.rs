//! In-memory secret store for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{normalize_secret, reject_empty, SecretStore};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.secrets
            .lock()
            .map_err(|_| Error::KeyUnavailable("secret store lock poisoned".to_string()))
    }
}

impl SecretStore for MemorySecretStore {
    fn read_secret(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .lock()?
            .get(name)
            .and_then(|value| normalize_secret(value)))
    }

    fn write_secret(&self, name: &str, value: &str) -> Result<()> {
        let value = reject_empty(value)?;
        self.lock()?.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete_secret(&self, name: &str) -> Result<()> {
        self.lock()?.remove(name);
        Ok(())
    }
}
