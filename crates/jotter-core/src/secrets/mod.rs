//! Secure secret storage and encryption key management.
//!
//! [`SecretManager`] is the only owner of the note encryption key. It sits on
//! top of a [`SecretStore`] capability so platform keychains, a local key file
//! and an in-memory test store are interchangeable.

mod file;
mod keyring_store;
mod memory;

use std::sync::Arc;

pub use file::FileSecretStore;
pub use keyring_store::KeyringSecretStore;
pub use memory::MemorySecretStore;

use crate::crypto::EncryptionKey;
use crate::error::{Error, Result};

/// Service name used for platform credential stores
pub const SECRET_SERVICE_NAME: &str = "jotter";

/// Secret name holding the base64 note encryption key
pub const SECRET_NOTE_KEY: &str = "note_encryption_key";

/// Text secret storage capability
pub trait SecretStore: Send + Sync {
    /// Read a secret; `Ok(None)` when it does not exist
    fn read_secret(&self, name: &str) -> Result<Option<String>>;

    /// Create or replace a secret
    fn write_secret(&self, name: &str, value: &str) -> Result<()>;

    /// Delete a secret; deleting a missing secret succeeds
    fn delete_secret(&self, name: &str) -> Result<()>;
}

/// Owner of the note encryption key
#[derive(Clone)]
pub struct SecretManager {
    store: Arc<dyn SecretStore>,
}

impl SecretManager {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Manager over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySecretStore::new()))
    }

    /// Return the stored key, creating and persisting one on first use.
    ///
    /// A stored value that is not a valid key is reported as
    /// [`Error::KeyUnavailable`] and left untouched: replacing it would make
    /// every row sealed under it unreadable.
    pub fn get_or_create_key(&self) -> Result<EncryptionKey> {
        if let Some(encoded) = self.store.read_secret(SECRET_NOTE_KEY)? {
            return EncryptionKey::from_base64(&encoded);
        }

        let key = EncryptionKey::generate();
        self.store.write_secret(SECRET_NOTE_KEY, &key.to_base64())?;
        tracing::info!("Generated new note encryption key");
        Ok(key)
    }

    /// Return the stored key without creating one
    pub fn key(&self) -> Result<Option<EncryptionKey>> {
        self.store
            .read_secret(SECRET_NOTE_KEY)?
            .map(|encoded| EncryptionKey::from_base64(&encoded))
            .transpose()
    }

    pub fn has_key(&self) -> Result<bool> {
        Ok(self.store.read_secret(SECRET_NOTE_KEY)?.is_some())
    }

    /// Forget the key. Rows still sealed under it become unreadable.
    pub fn delete_key(&self) -> Result<()> {
        self.store.delete_secret(SECRET_NOTE_KEY)?;
        tracing::info!("Deleted note encryption key");
        Ok(())
    }
}

fn normalize_secret(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn reject_empty(value: &str) -> Result<&str> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::InvalidInput(
            "secret value must not be empty".to_string(),
        ))
    } else {
        Ok(value)
    }
}
