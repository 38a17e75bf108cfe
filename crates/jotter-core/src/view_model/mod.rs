//! Note list view-model.
//!
//! Holds the state a list/detail/settings UI binds to and mediates between UI
//! actions, the [`NoteStore`], the [`SecretManager`] and the
//! [`LocationProvider`]. Every observable change bumps a version published on
//! a `tokio::sync::watch` channel.

mod encryption;
mod reorder;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

use crate::crypto::{decode_row, encode_note, FieldCipher};
use crate::db::{NoteStore, SettingsStore};
use crate::error::{Error, Result};
use crate::location::{describe, LocationProvider};
use crate::models::{Appearance, Note, NoteId, Settings};
use crate::secrets::SecretManager;
use crate::state::EncryptionState;

pub use encryption::EncryptionPass;
pub use reorder::move_offsets;

/// Point-in-time copy of every observable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub items: Vec<Note>,
    pub filter: String,
    pub encrypted: bool,
    pub crypting: bool,
    pub encryption_state: EncryptionState,
    pub use_location: bool,
    pub location_description: String,
    pub appearance: Appearance,
}

#[derive(Default)]
struct ViewState {
    loaded: bool,
    /// Every note in store order, plaintext
    notes: Vec<Note>,
    filter: String,
    encryption: EncryptionState,
    settings: Settings,
    location_description: Option<String>,
    cipher: Option<Arc<FieldCipher>>,
}

impl ViewState {
    fn visible(&self) -> impl Iterator<Item = &Note> {
        self.notes
            .iter()
            .filter(|note| note.matches_filter(&self.filter))
    }

    /// Cipher for new writes, following the current target state
    fn write_cipher(&self) -> Result<Option<&FieldCipher>> {
        if !self.encryption.target() {
            return Ok(None);
        }
        self.cipher
            .as_deref()
            .map(Some)
            .ok_or_else(|| Error::KeyUnavailable("encryption key was not loaded".to_string()))
    }
}

struct Inner<S> {
    store: Mutex<S>,
    secrets: SecretManager,
    location: Arc<dyn LocationProvider>,
    state: Mutex<ViewState>,
    changes: watch::Sender<u64>,
}

/// View-model over a note store
///
/// Cheap to clone; clones share the same state.
pub struct ViewModel<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for ViewModel<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: NoteStore + SettingsStore> ViewModel<S> {
    pub fn new(store: S, secrets: SecretManager, location: Arc<dyn LocationProvider>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                store: Mutex::new(store),
                secrets,
                location,
                state: Mutex::new(ViewState::default()),
                changes,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self) -> MutexGuard<'_, S> {
        self.inner
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|version| *version += 1);
    }

    /// Receiver that observes a new version after every state change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    /// Current change version
    pub fn version(&self) -> u64 {
        *self.inner.changes.borrow()
    }

    /// Run `f` with exclusive access to the underlying store
    pub fn with_store<T>(&self, f: impl FnOnce(&mut S) -> T) -> T {
        f(&mut self.store())
    }

    /// Read settings and every note from the store, replacing in-memory state
    pub fn load(&self) -> Result<()> {
        let mut state = self.state();
        self.load_into(&mut state)?;
        drop(state);
        self.notify();
        Ok(())
    }

    fn ensure_loaded(&self) -> Result<MutexGuard<'_, ViewState>> {
        let mut state = self.state();
        if !state.loaded {
            self.load_into(&mut state)?;
            self.notify();
        }
        Ok(state)
    }

    fn load_into(&self, state: &mut ViewState) -> Result<()> {
        if state.encryption.is_crypting() {
            return Err(Error::EncryptionInProgress);
        }

        let (settings, rows) = {
            let store = self.store();
            (store.load_settings()?, store.list()?)
        };

        let encrypted_rows = rows.iter().filter(|row| row.encrypted).count();
        let mismatched = rows
            .iter()
            .filter(|row| row.encrypted != settings.encrypted)
            .count();
        if mismatched > 0 {
            tracing::warn!(
                "{mismatched} of {} notes do not match the encryption setting ({}); toggling encryption again will converge them",
                rows.len(),
                if settings.encrypted { "on" } else { "off" }
            );
        }

        let cipher = if encrypted_rows > 0 {
            let key = self.inner.secrets.key()?.ok_or_else(|| {
                Error::KeyUnavailable(format!(
                    "{encrypted_rows} notes are encrypted but no key is stored"
                ))
            })?;
            Some(Arc::new(FieldCipher::new(&key)))
        } else if settings.encrypted {
            let key = self.inner.secrets.get_or_create_key()?;
            Some(Arc::new(FieldCipher::new(&key)))
        } else {
            None
        };

        let notes = rows
            .iter()
            .map(|row| decode_row(row, cipher.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Loaded {} notes", notes.len());
        state.notes = notes;
        state.encryption = EncryptionState::stable(settings.encrypted);
        state.settings = settings;
        state.cipher = cipher;
        state.location_description = None;
        state.loaded = true;
        Ok(())
    }

    /// Read-modify-write one settings field under the store lock, so a
    /// concurrent pass committing `encrypted` is never overwritten
    fn update_settings(&self, state: &mut ViewState, apply: impl Fn(&mut Settings)) -> Result<()> {
        let mut store = self.store();
        let mut settings = store.load_settings()?;
        apply(&mut settings);
        store.save_settings(&settings)?;
        drop(store);

        apply(&mut state.settings);
        Ok(())
    }

    /// Notes matching the filter, in store order
    pub fn items(&self) -> Result<Vec<Note>> {
        let state = self.ensure_loaded()?;
        Ok(state.visible().cloned().collect())
    }

    /// Look up a note by id regardless of the filter
    pub fn item(&self, id: &NoteId) -> Result<Option<Note>> {
        let state = self.ensure_loaded()?;
        Ok(state.notes.iter().find(|note| note.id == *id).cloned())
    }

    pub fn filter(&self) -> String {
        self.state().filter.clone()
    }

    /// Replace the filter text; never touches the store
    pub fn set_filter(&self, filter: impl Into<String>) {
        let filter = filter.into();
        {
            let mut state = self.state();
            if state.filter == filter {
                return;
            }
            state.filter = filter;
        }
        self.notify();
    }

    /// Create an empty note at the top of the list and return it
    pub fn add_item(&self) -> Result<Note> {
        let mut state = self.ensure_loaded()?;
        let note = Note::new();
        let row = encode_note(&note, state.write_cipher()?)?;
        self.store().insert(&row)?;

        state.notes.insert(0, note.clone());
        drop(state);

        tracing::debug!("Added note {}", note.id);
        self.notify();
        Ok(note)
    }

    /// Whether `item` differs from the stored version of the same note
    ///
    /// A note that is no longer stored counts as updated.
    pub fn is_updated(&self, item: &Note) -> Result<bool> {
        let state = self.ensure_loaded()?;
        Ok(state
            .notes
            .iter()
            .find(|note| note.id == item.id)
            .is_none_or(|stored| !stored.same_content(item)))
    }

    /// Persist `item` if it changed. Returns whether a write happened.
    ///
    /// Saving an unchanged note, or one that was deleted meanwhile, is a
    /// no-op.
    pub fn save(&self, item: &Note) -> Result<bool> {
        let mut state = self.ensure_loaded()?;
        let Some(index) = state.notes.iter().position(|note| note.id == item.id) else {
            tracing::debug!("Ignoring save for missing note {}", item.id);
            return Ok(false);
        };
        if state.notes[index].same_content(item) {
            return Ok(false);
        }

        let row = encode_note(item, state.write_cipher()?)?;
        match self.store().update(&row) {
            Ok(()) => {
                state.notes[index] = item.clone();
            }
            Err(error) if error.is_not_found() => {
                tracing::debug!("Note {} vanished from the store", item.id);
                state.notes.remove(index);
                drop(state);
                self.notify();
                return Ok(false);
            }
            Err(error) => return Err(error),
        }
        drop(state);

        self.notify();
        Ok(true)
    }

    /// Delete the notes at the given visible positions.
    ///
    /// Store and list change together: if the store fails nothing is removed.
    pub fn remove(&self, offsets: &[usize]) -> Result<usize> {
        let mut state = self.ensure_loaded()?;
        let visible: Vec<NoteId> = state.visible().map(|note| note.id).collect();

        let mut ids = Vec::with_capacity(offsets.len());
        for &offset in offsets {
            let id = visible.get(offset).copied().ok_or_else(|| {
                Error::InvalidInput(format!(
                    "position {offset} is out of range for {} notes",
                    visible.len()
                ))
            })?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Ok(0);
        }

        self.store().delete(&ids)?;
        state.notes.retain(|note| !ids.contains(&note.id));
        drop(state);

        tracing::debug!("Removed {} notes", ids.len());
        self.notify();
        Ok(ids.len())
    }

    /// Move the visible notes at `from_offsets` to `to_offset` and persist
    /// the new order.
    ///
    /// `to_offset` is an index into the visible list before the move. With a
    /// filter active, hidden notes keep their slots.
    pub fn move_items(&self, from_offsets: &[usize], to_offset: usize) -> Result<()> {
        let mut state = self.ensure_loaded()?;

        let slots: Vec<usize> = state
            .notes
            .iter()
            .enumerate()
            .filter(|(_, note)| note.matches_filter(&state.filter))
            .map(|(index, _)| index)
            .collect();
        let visible: Vec<Note> = slots.iter().map(|&index| state.notes[index].clone()).collect();
        let moved = move_offsets(&visible, from_offsets, to_offset)?;

        let mut reordered = state.notes.clone();
        for (slot, note) in slots.into_iter().zip(moved) {
            reordered[slot] = note;
        }
        if reordered == state.notes {
            return Ok(());
        }

        let ids: Vec<NoteId> = reordered.iter().map(|note| note.id).collect();
        self.store().reorder(&ids)?;
        state.notes = reordered;
        drop(state);

        self.notify();
        Ok(())
    }

    /// Target encryption state shown by the settings toggle
    pub fn encrypted(&self) -> bool {
        self.state().encryption.target()
    }

    /// Whether a bulk encrypt/decrypt pass is running
    pub fn crypting(&self) -> bool {
        self.state().encryption.is_crypting()
    }

    pub fn encryption_state(&self) -> EncryptionState {
        self.state().encryption
    }

    pub fn use_location(&self) -> bool {
        self.state().settings.use_location
    }

    /// Toggle location use. Enabling asks the provider for permission.
    pub fn set_use_location(&self, enabled: bool) -> Result<()> {
        let mut state = self.ensure_loaded()?;

        let description = if enabled {
            let permission = self.inner.location.request_permission();
            tracing::debug!("Location permission: {permission:?}");
            let place = self.inner.location.place_name();
            describe(true, permission, place.as_deref())
        } else {
            describe(false, self.inner.location.permission_state(), None)
        };

        self.update_settings(&mut state, |settings| settings.use_location = enabled)?;
        state.location_description = Some(description);
        drop(state);

        self.notify();
        Ok(())
    }

    /// Permission and availability text for display
    pub fn location_description(&self) -> Result<String> {
        let mut state = self.ensure_loaded()?;
        if let Some(description) = &state.location_description {
            return Ok(description.clone());
        }

        let enabled = state.settings.use_location;
        let permission = self.inner.location.permission_state();
        let place = if enabled {
            self.inner.location.place_name()
        } else {
            None
        };
        let description = describe(enabled, permission, place.as_deref());
        state.location_description = Some(description.clone());
        Ok(description)
    }

    pub fn appearance(&self) -> Result<Appearance> {
        Ok(self.ensure_loaded()?.settings.appearance)
    }

    pub fn set_appearance(&self, appearance: Appearance) -> Result<()> {
        let mut state = self.ensure_loaded()?;
        if state.settings.appearance == appearance {
            return Ok(());
        }

        self.update_settings(&mut state, |settings| settings.appearance = appearance)?;
        drop(state);

        self.notify();
        Ok(())
    }

    /// Copy of every observable field
    pub fn snapshot(&self) -> Result<ViewSnapshot> {
        let location_description = self.location_description()?;
        let state = self.ensure_loaded()?;
        Ok(ViewSnapshot {
            items: state.visible().cloned().collect(),
            filter: state.filter.clone(),
            encrypted: state.encryption.target(),
            crypting: state.encryption.is_crypting(),
            encryption_state: state.encryption,
            use_location: state.settings.use_location,
            location_description,
            appearance: state.settings.appearance,
        })
    }

    /// Forget the encryption key; refused while any stored note needs it
    pub fn forget_key(&self) -> Result<()> {
        let mut state = self.ensure_loaded()?;
        if state.encryption != EncryptionState::Plain {
            return Err(Error::InvalidInput(
                "turn encryption off before forgetting the key".to_string(),
            ));
        }
        let sealed = self.store().list()?.iter().filter(|row| row.encrypted).count();
        if sealed > 0 {
            return Err(Error::InvalidInput(format!(
                "{sealed} notes are still encrypted with this key"
            )));
        }

        self.inner.secrets.delete_key()?;
        state.cipher = None;
        Ok(())
    }

    pub fn secrets(&self) -> &SecretManager {
        &self.inner.secrets
    }
}

#[cfg(test)]
mod tests;
