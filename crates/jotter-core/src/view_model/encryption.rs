//! Bulk encrypt/decrypt pass.
//!
//! Each stored row carries its own `encrypted` marker. A pass snapshots the
//! rows whose marker differs from the target, re-encodes them without holding
//! the store, and commits every rewrite together with the `encrypted` setting
//! in one transaction guarded by the old marker. Notes saved while the pass
//! runs are already written under the target policy, so the guard skips them
//! instead of overwriting newer text.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::ViewModel;
use crate::crypto::{decode_row, encode_note, FieldCipher};
use crate::db::{NoteStore, SettingsStore};
use crate::error::{Error, Result};
use crate::state::EncryptionState;

/// A started pass: the view-model is already in its transitional state
pub struct EncryptionPass {
    target: bool,
    prior: EncryptionState,
    cipher: Option<Arc<FieldCipher>>,
}

impl EncryptionPass {
    pub const fn target(&self) -> bool {
        self.target
    }
}

impl<S: NoteStore + SettingsStore> ViewModel<S> {
    /// Move every stored note to the `encrypted` state, blocking until done.
    ///
    /// On failure nothing is rewritten, the toggle returns to its prior
    /// state and the error is returned.
    pub fn set_encrypted(&self, encrypted: bool) -> Result<()> {
        let pass = self.begin_encryption(encrypted)?;
        self.finish_encryption(pass)
    }

    /// Start the pass here and run it on a blocking worker.
    ///
    /// Re-entrant toggles are rejected before anything is spawned; other
    /// operations stay usable while the worker runs.
    pub fn spawn_set_encrypted(&self, encrypted: bool) -> Result<JoinHandle<Result<()>>>
    where
        S: Send + 'static,
    {
        let pass = self.begin_encryption(encrypted)?;
        let view_model = self.clone();
        Ok(tokio::task::spawn_blocking(move || {
            view_model.finish_encryption(pass)
        }))
    }

    /// Enter `Encrypting`/`Decrypting`, loading the key the pass needs
    pub fn begin_encryption(&self, encrypted: bool) -> Result<EncryptionPass> {
        let mut state = self.ensure_loaded()?;
        if state.encryption.is_crypting() {
            return Err(Error::EncryptionInProgress);
        }

        let cipher = match (&state.cipher, encrypted) {
            (Some(cipher), _) => Some(Arc::clone(cipher)),
            (None, true) => {
                let key = self.inner.secrets.get_or_create_key()?;
                Some(Arc::new(FieldCipher::new(&key)))
            }
            (None, false) => None,
        };

        let prior = state.encryption;
        state.encryption = EncryptionState::transition_to(encrypted);
        state.cipher.clone_from(&cipher);
        drop(state);

        tracing::info!(
            "Starting {} pass",
            if encrypted { "encryption" } else { "decryption" }
        );
        self.notify();
        Ok(EncryptionPass {
            target: encrypted,
            prior,
            cipher,
        })
    }

    /// Run a started pass to completion or failure and settle the state
    pub fn finish_encryption(&self, pass: EncryptionPass) -> Result<()> {
        let result = self.run_pass(&pass);

        let mut state = self.state();
        match &result {
            Ok(rewritten) => {
                state.encryption = EncryptionState::stable(pass.target);
                state.settings.encrypted = pass.target;
                tracing::info!(
                    "{} pass complete: {rewritten} notes rewritten",
                    if pass.target { "Encryption" } else { "Decryption" }
                );
            }
            Err(error) => {
                state.encryption = pass.prior;
                tracing::error!("Encryption pass failed: {error}");
            }
        }
        drop(state);

        self.notify();
        result.map(|_| ())
    }

    fn run_pass(&self, pass: &EncryptionPass) -> Result<usize> {
        let target_cipher = if pass.target {
            Some(pass.cipher.as_deref().ok_or_else(|| {
                Error::KeyUnavailable("encryption key was not loaded".to_string())
            })?)
        } else {
            None
        };

        let rows = self.store().list()?;

        let mut rewrites = Vec::new();
        for row in rows.iter().filter(|row| row.encrypted != pass.target) {
            let rewrite = decode_row(row, pass.cipher.as_deref())
                .and_then(|note| encode_note(&note, target_cipher))
                .map_err(|source| Error::EncryptionPass {
                    failed: row.id(),
                    source: Box::new(source),
                })?;
            rewrites.push(rewrite);
        }

        let mut store = self.store();
        let mut settings = store.load_settings()?;
        settings.encrypted = pass.target;
        store.commit_pass(&rewrites, !pass.target, &settings)
    }
}
