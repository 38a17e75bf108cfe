//! Field-level encryption for note text
//!
//! Each field is sealed independently with AES-256-GCM under a fresh 96-bit
//! nonce and stored as `base64(nonce || ciphertext)`.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose, Engine as _};

use crate::db::StoredNote;
use crate::error::{Error, Result};
use crate::models::Note;

/// Key length in bytes
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;

/// 256-bit symmetric key
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Generate a random key from the OS RNG
    #[must_use]
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(key.as_slice());
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Encode for storage in a text-only secret store
    #[must_use]
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(self.0)
    }

    /// Decode a stored key; anything but exactly 32 bytes is rejected
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|error| Error::KeyUnavailable(format!("stored key is not base64: {error}")))?;
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            Error::KeyUnavailable(format!(
                "stored key has {} bytes, expected {KEY_LEN}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Seals and opens note text fields
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    pub fn new(key: &EncryptionKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0)),
        }
    }

    /// Encrypt a single field
    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|error| Error::Encryption(format!("failed to seal field: {error}")))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(nonce.as_slice());
        payload.extend_from_slice(&ciphertext);
        Ok(general_purpose::STANDARD.encode(payload))
    }

    /// Decrypt a single field produced by [`FieldCipher::seal`]
    pub fn open(&self, sealed: &str) -> Result<String> {
        let payload = general_purpose::STANDARD
            .decode(sealed)
            .map_err(|error| Error::Encryption(format!("sealed field is not base64: {error}")))?;
        if payload.len() < NONCE_LEN {
            return Err(Error::Encryption("sealed field is truncated".to_string()));
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Encryption("sealed field failed authentication".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|error| Error::Encryption(format!("opened field is not UTF-8: {error}")))
    }

    /// Seal title and notes, marking the row encrypted
    pub fn seal_note(&self, note: &Note) -> Result<StoredNote> {
        let mut sealed = note.clone();
        sealed.title = self.seal(&note.title)?;
        sealed.notes = self.seal(&note.notes)?;
        Ok(StoredNote {
            note: sealed,
            encrypted: true,
        })
    }

    /// Open a row according to its own marker
    pub fn open_row(&self, row: &StoredNote) -> Result<Note> {
        if !row.encrypted {
            return Ok(row.note.clone());
        }
        let mut note = row.note.clone();
        note.title = self.open(&row.note.title)?;
        note.notes = self.open(&row.note.notes)?;
        Ok(note)
    }
}

/// Encode a plaintext note for storage under the given policy
pub fn encode_note(note: &Note, cipher: Option<&FieldCipher>) -> Result<StoredNote> {
    cipher.map_or_else(
        || Ok(StoredNote::plain(note.clone())),
        |cipher| cipher.seal_note(note),
    )
}

/// Decode a stored row; encrypted rows require a cipher
pub fn decode_row(row: &StoredNote, cipher: Option<&FieldCipher>) -> Result<Note> {
    match (row.encrypted, cipher) {
        (false, _) => Ok(row.note.clone()),
        (true, Some(cipher)) => cipher.open_row(row),
        (true, None) => Err(Error::KeyUnavailable(format!(
            "note {} is encrypted but no key was loaded",
            row.id()
        ))),
    }
}
