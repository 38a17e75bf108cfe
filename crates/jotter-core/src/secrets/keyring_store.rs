//! Platform credential store backed by the `keyring` crate.

use keyring::{Entry, Error as KeyringError};

use super::{normalize_secret, reject_empty, SecretStore, SECRET_SERVICE_NAME};
use crate::error::{Error, Result};

/// Secrets kept in the OS keychain / credential manager
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, name: &str) -> Result<Entry> {
        Entry::new(&self.service, name).map_err(map_keyring_error)
    }
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new(SECRET_SERVICE_NAME)
    }
}

impl SecretStore for KeyringSecretStore {
    fn read_secret(&self, name: &str) -> Result<Option<String>> {
        match self.entry(name)?.get_password() {
            Ok(value) => Ok(normalize_secret(&value)),
            Err(KeyringError::NoEntry) => Ok(None),
            Err(error) => Err(map_keyring_error(error)),
        }
    }

    fn write_secret(&self, name: &str, value: &str) -> Result<()> {
        let value = reject_empty(value)?;
        self.entry(name)?
            .set_password(value)
            .map_err(map_keyring_error)
    }

    fn delete_secret(&self, name: &str) -> Result<()> {
        match self.entry(name)?.delete_credential() {
            Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
            Err(error) => Err(map_keyring_error(error)),
        }
    }
}

fn map_keyring_error(error: KeyringError) -> Error {
    match error {
        KeyringError::NoStorageAccess(inner) => {
            Error::KeyUnavailable(format!("secure store is not accessible: {inner}"))
        }
        KeyringError::NoEntry => Error::KeyUnavailable("secret does not exist".to_string()),
        other => Error::KeyUnavailable(other.to_string()),
    }
}
