use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::crypto::FieldCipher;
use crate::db::{SqliteNoteStore, StoredNote};
use crate::location::{FixedLocationProvider, PermissionState};

fn view_model() -> ViewModel<SqliteNoteStore> {
    view_model_with(SecretManager::in_memory())
}

fn view_model_with(secrets: SecretManager) -> ViewModel<SqliteNoteStore> {
    ViewModel::new(
        SqliteNoteStore::open_in_memory().unwrap(),
        secrets,
        Arc::new(FixedLocationProvider::denied()),
    )
}

/// Add a note and give it content, returning the saved version
fn add_note<S: NoteStore + SettingsStore>(vm: &ViewModel<S>, title: &str, notes: &str) -> Note {
    let note = vm.add_item().unwrap().with_title(title).with_notes(notes);
    assert!(vm.save(&note).unwrap());
    note
}

fn titles<S: NoteStore + SettingsStore>(vm: &ViewModel<S>) -> Vec<String> {
    vm.items()
        .unwrap()
        .into_iter()
        .map(|note| note.title)
        .collect()
}

fn stored_rows<S: NoteStore + SettingsStore>(vm: &ViewModel<S>) -> Vec<StoredNote> {
    vm.with_store(|store| store.list().unwrap())
}

/// Store wrapper whose writes can be switched to fail
struct FlakyStore {
    inner: SqliteNoteStore,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    fn check(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::Io(std::io::Error::other("disk full")))
        } else {
            Ok(())
        }
    }
}

impl NoteStore for FlakyStore {
    fn list(&self) -> Result<Vec<StoredNote>> {
        self.inner.list()
    }

    fn get(&self, id: &NoteId) -> Result<Option<StoredNote>> {
        self.inner.get(id)
    }

    fn insert(&mut self, row: &StoredNote) -> Result<NoteId> {
        self.check()?;
        self.inner.insert(row)
    }

    fn update(&mut self, row: &StoredNote) -> Result<()> {
        self.check()?;
        self.inner.update(row)
    }

    fn delete(&mut self, ids: &[NoteId]) -> Result<usize> {
        self.check()?;
        self.inner.delete(ids)
    }

    fn reorder(&mut self, ids: &[NoteId]) -> Result<()> {
        self.check()?;
        self.inner.reorder(ids)
    }
}

impl SettingsStore for FlakyStore {
    fn load_settings(&self) -> Result<Settings> {
        self.inner.load_settings()
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<()> {
        self.check()?;
        self.inner.save_settings(settings)
    }

    fn commit_pass(
        &mut self,
        rows: &[StoredNote],
        expected_encrypted: bool,
        settings: &Settings,
    ) -> Result<usize> {
        self.check()?;
        self.inner.commit_pass(rows, expected_encrypted, settings)
    }
}

fn flaky_view_model() -> (ViewModel<FlakyStore>, Arc<AtomicBool>) {
    let fail_writes = Arc::new(AtomicBool::new(false));
    let store = FlakyStore {
        inner: SqliteNoteStore::open_in_memory().unwrap(),
        fail_writes: Arc::clone(&fail_writes),
    };
    let vm = ViewModel::new(
        store,
        SecretManager::in_memory(),
        Arc::new(FixedLocationProvider::denied()),
    );
    (vm, fail_writes)
}

#[test]
fn added_note_reads_back_unchanged() {
    let vm = view_model();
    let mut note = add_note(&vm, "Groceries", "milk, eggs");
    note.favorite = true;
    note.date = 1_700_000_000_000;
    assert!(vm.save(&note).unwrap());

    let rows = stored_rows(&vm);
    assert_eq!(rows, vec![StoredNote::plain(note.clone())]);

    vm.load().unwrap();
    assert_eq!(vm.items().unwrap(), vec![note]);
}

#[test]
fn add_inserts_fresh_note_at_top() {
    let vm = view_model();
    let b = add_note(&vm, "t", "n");
    let a = vm.add_item().unwrap();
    assert_eq!(vm.items().unwrap(), vec![a.clone(), b.clone()]);

    let new = vm.add_item().unwrap();
    assert!(new.is_empty());
    assert_ne!(new.id, a.id);
    assert_ne!(new.id, b.id);
    assert_eq!(vm.items().unwrap(), vec![new, a, b]);
}

#[test]
fn is_updated_compares_every_editable_field() {
    let vm = view_model();
    let note = add_note(&vm, "Title", "Body");
    assert!(!vm.is_updated(&note).unwrap());

    assert!(vm.is_updated(&note.clone().with_title("Other")).unwrap());
    assert!(vm.is_updated(&note.clone().with_notes("Other")).unwrap());

    let mut starred = note.clone();
    starred.favorite = true;
    assert!(vm.is_updated(&starred).unwrap());

    let mut redated = note.clone();
    redated.date += 1;
    assert!(vm.is_updated(&redated).unwrap());

    // Saving an unchanged note is a no-op, not an error
    assert!(!vm.save(&note).unwrap());
}

#[test]
fn save_of_deleted_note_is_benign() {
    let vm = view_model();
    let note = add_note(&vm, "Doomed", "");
    vm.with_store(|store| store.delete(&[note.id]).unwrap());

    assert!(!vm.save(&note.clone().with_title("Edited")).unwrap());
    assert!(vm.items().unwrap().is_empty());

    // Unknown ids are ignored too
    assert!(!vm.save(&Note::new().with_title("stranger")).unwrap());
}

#[test]
fn filter_matches_title_and_notes_case_insensitively() {
    let vm = view_model();
    add_note(&vm, "C", "nothing");
    add_note(&vm, "B", "Buy MILK");
    add_note(&vm, "A Milkshake", "");

    vm.set_filter("");
    assert_eq!(titles(&vm), vec!["A Milkshake", "B", "C"]);

    vm.set_filter("milk");
    assert_eq!(titles(&vm), vec!["A Milkshake", "B"]);

    // The store is untouched by filtering
    assert_eq!(stored_rows(&vm).len(), 3);
}

#[test]
fn remove_positions_deletes_from_store_and_list() {
    let vm = view_model();
    for title in ["D", "C", "B", "A"] {
        add_note(&vm, title, "");
    }
    assert_eq!(titles(&vm), vec!["A", "B", "C", "D"]);

    assert_eq!(vm.remove(&[1, 3]).unwrap(), 2);
    assert_eq!(titles(&vm), vec!["A", "C"]);

    let stored: Vec<String> = stored_rows(&vm)
        .into_iter()
        .map(|row| row.note.title)
        .collect();
    assert_eq!(stored, vec!["A", "C"]);
}

#[test]
fn remove_uses_visible_positions() {
    let vm = view_model();
    add_note(&vm, "keep", "");
    add_note(&vm, "drop me", "");
    add_note(&vm, "drop me too", "");

    vm.set_filter("drop");
    vm.remove(&[1]).unwrap();
    vm.set_filter("");
    assert_eq!(titles(&vm), vec!["drop me too", "keep"]);
}

#[test]
fn remove_out_of_range_changes_nothing() {
    let vm = view_model();
    add_note(&vm, "only", "");
    assert!(matches!(vm.remove(&[0, 5]), Err(Error::InvalidInput(_))));
    assert_eq!(titles(&vm), vec!["only"]);
}

#[test]
fn failed_remove_keeps_list_and_store_in_step() {
    let (vm, fail_writes) = flaky_view_model();
    add_note(&vm, "B", "");
    add_note(&vm, "A", "");

    fail_writes.store(true, Ordering::SeqCst);
    assert!(matches!(vm.remove(&[0]), Err(Error::Io(_))));
    assert_eq!(titles(&vm), vec!["A", "B"]);
    assert_eq!(stored_rows(&vm).len(), 2);
}

#[test]
fn move_item_to_front_persists_order() {
    let vm = view_model();
    for title in ["D", "C", "B", "A"] {
        add_note(&vm, title, "");
    }

    vm.move_items(&[2], 0).unwrap();
    assert_eq!(titles(&vm), vec!["C", "A", "B", "D"]);

    vm.load().unwrap();
    assert_eq!(titles(&vm), vec!["C", "A", "B", "D"]);
}

#[test]
fn move_with_filter_keeps_hidden_notes_in_place() {
    let vm = view_model();
    for title in ["x3", "hidden", "x2", "x1"] {
        add_note(&vm, title, "");
    }
    assert_eq!(titles(&vm), vec!["x1", "x2", "hidden", "x3"]);

    vm.set_filter("x");
    vm.move_items(&[2], 0).unwrap();
    assert_eq!(titles(&vm), vec!["x3", "x1", "x2"]);

    vm.set_filter("");
    assert_eq!(titles(&vm), vec!["x3", "x1", "hidden", "x2"]);
}

#[test]
fn encrypt_then_decrypt_restores_plaintext() {
    let vm = view_model();
    let first = add_note(&vm, "Diary", "Dear diary");
    // Blank fields are sealed too
    let second = vm.add_item().unwrap();
    assert!(second.is_empty());
    let before = vm.items().unwrap();

    vm.set_encrypted(true).unwrap();
    assert!(vm.encrypted());
    assert_eq!(vm.encryption_state(), EncryptionState::Encrypted);
    assert_eq!(vm.items().unwrap(), before);

    let rows = stored_rows(&vm);
    assert!(rows.iter().all(|row| row.encrypted));
    let sealed = rows.iter().find(|row| row.id() == first.id).unwrap();
    assert_ne!(sealed.note.title, "Diary");
    assert_ne!(sealed.note.notes, "Dear diary");
    assert_eq!(sealed.note.date, first.date);

    vm.set_encrypted(false).unwrap();
    assert!(!vm.encrypted());
    let rows = stored_rows(&vm);
    assert!(rows.iter().all(|row| !row.encrypted));
    assert_eq!(
        rows.into_iter().map(|row| row.note).collect::<Vec<_>>(),
        vec![second, first]
    );
}

#[test]
fn writes_while_encrypted_are_sealed() {
    let vm = view_model();
    vm.set_encrypted(true).unwrap();

    let note = add_note(&vm, "secret", "plans");
    let row = vm.with_store(|store| store.get(&note.id).unwrap().unwrap());
    assert!(row.encrypted);
    assert_ne!(row.note.title, "secret");

    vm.load().unwrap();
    assert_eq!(vm.items().unwrap(), vec![note]);
}

#[test]
fn encrypted_store_reopens_with_same_key() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("notes.db");
    let secrets = SecretManager::in_memory();

    let note = {
        let vm = ViewModel::new(
            SqliteNoteStore::open(&path).unwrap(),
            secrets.clone(),
            Arc::new(FixedLocationProvider::denied()),
        );
        let note = add_note(&vm, "kept", "across restarts");
        vm.set_encrypted(true).unwrap();
        note
    };

    let vm = ViewModel::new(
        SqliteNoteStore::open(&path).unwrap(),
        secrets,
        Arc::new(FixedLocationProvider::denied()),
    );
    assert_eq!(vm.encryption_state(), EncryptionState::Plain);
    vm.load().unwrap();
    assert!(vm.encrypted());
    assert_eq!(vm.items().unwrap(), vec![note]);
}

#[test]
fn encrypted_rows_without_key_are_key_unavailable() {
    let secrets = SecretManager::in_memory();
    let vm = view_model_with(secrets.clone());
    add_note(&vm, "sealed", "");
    vm.set_encrypted(true).unwrap();

    secrets.delete_key().unwrap();
    assert!(matches!(vm.load(), Err(Error::KeyUnavailable(_))));
}

#[test]
fn failing_row_rolls_back_whole_pass() {
    let vm = view_model();
    add_note(&vm, "one", "");
    let broken = add_note(&vm, "two", "");
    add_note(&vm, "three", "");
    vm.set_encrypted(true).unwrap();

    let mut garbage = vm.with_store(|store| store.get(&broken.id).unwrap().unwrap());
    garbage.note.title = "not-a-sealed-value".to_string();
    vm.with_store(|store| store.update(&garbage).unwrap());
    let before = stored_rows(&vm);

    let error = vm.set_encrypted(false).unwrap_err();
    match error {
        Error::EncryptionPass { failed, .. } => assert_eq!(failed, broken.id),
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(vm.encryption_state(), EncryptionState::Encrypted);
    assert!(!vm.crypting());
    assert_eq!(stored_rows(&vm), before);
    assert!(vm.with_store(|store| store.load_settings().unwrap()).encrypted);
}

#[test]
fn failed_commit_returns_to_prior_state() {
    let (vm, fail_writes) = flaky_view_model();
    add_note(&vm, "plain", "text");

    fail_writes.store(true, Ordering::SeqCst);
    assert!(matches!(vm.set_encrypted(true), Err(Error::Io(_))));
    assert_eq!(vm.encryption_state(), EncryptionState::Plain);
    assert!(!vm.encrypted());
    assert!(stored_rows(&vm).iter().all(|row| !row.encrypted));

    fail_writes.store(false, Ordering::SeqCst);
    vm.set_encrypted(true).unwrap();
    assert!(stored_rows(&vm).iter().all(|row| row.encrypted));
}

#[test]
fn settings_failure_inside_commit_keeps_rows_plain() {
    let vm = view_model();
    let note = add_note(&vm, "plain", "text");
    vm.with_store(|store| {
        store
            .database()
            .connection()
            .execute_batch(
                "CREATE TRIGGER settings_read_only BEFORE INSERT ON settings
                 BEGIN SELECT RAISE(ABORT, 'settings are read-only'); END;",
            )
            .unwrap();
    });

    assert!(matches!(vm.set_encrypted(true), Err(Error::Database(_))));
    assert_eq!(vm.encryption_state(), EncryptionState::Plain);
    assert_eq!(stored_rows(&vm), vec![StoredNote::plain(note)]);
    assert!(!vm.with_store(|store| store.load_settings().unwrap()).encrypted);
}

#[test]
fn toggle_is_rejected_while_pass_runs() {
    let vm = view_model();
    add_note(&vm, "a", "");

    let pass = vm.begin_encryption(true).unwrap();
    assert!(vm.crypting());
    assert!(vm.encrypted());
    assert_eq!(vm.encryption_state(), EncryptionState::Encrypting);
    assert!(matches!(
        vm.set_encrypted(false),
        Err(Error::EncryptionInProgress)
    ));

    // Unrelated operations keep working
    vm.set_filter("a");
    let added = vm.add_item().unwrap();
    assert_eq!(vm.items().unwrap().len(), 1);
    vm.set_filter("");

    vm.finish_encryption(pass).unwrap();
    assert_eq!(vm.encryption_state(), EncryptionState::Encrypted);
    assert!(stored_rows(&vm).iter().all(|row| row.encrypted));
    assert!(vm.item(&added.id).unwrap().is_some());
}

#[test]
fn save_during_pass_is_not_overwritten() {
    let vm = view_model();
    let note = add_note(&vm, "draft", "v1");

    let pass = vm.begin_encryption(true).unwrap();
    let edited = note.with_notes("v2");
    assert!(vm.save(&edited).unwrap());
    vm.finish_encryption(pass).unwrap();

    vm.load().unwrap();
    assert_eq!(vm.items().unwrap(), vec![edited]);
}

#[test]
fn mixed_store_loads_and_converges() {
    let secrets = SecretManager::in_memory();
    let vm = view_model_with(secrets.clone());
    let plain = add_note(&vm, "plain", "row");
    let sealed = add_note(&vm, "sealed", "row");

    // Simulate an interrupted pass from an older writer: one row sealed,
    // setting still off
    let cipher = FieldCipher::new(&secrets.get_or_create_key().unwrap());
    let row = cipher.seal_note(&sealed).unwrap();
    vm.with_store(|store| store.update(&row).unwrap());

    vm.load().unwrap();
    assert_eq!(vm.items().unwrap(), vec![sealed, plain]);
    assert!(!vm.encrypted());

    vm.set_encrypted(false).unwrap();
    assert!(stored_rows(&vm).iter().all(|row| !row.encrypted));
}

#[test]
fn forget_key_requires_plain_store() {
    let secrets = SecretManager::in_memory();
    let vm = view_model_with(secrets.clone());
    add_note(&vm, "a", "");
    vm.set_encrypted(true).unwrap();

    assert!(matches!(vm.forget_key(), Err(Error::InvalidInput(_))));
    assert!(secrets.has_key().unwrap());

    vm.set_encrypted(false).unwrap();
    vm.forget_key().unwrap();
    assert!(!secrets.has_key().unwrap());
}

#[test]
fn location_toggle_requests_permission() {
    let vm = ViewModel::new(
        SqliteNoteStore::open_in_memory().unwrap(),
        SecretManager::in_memory(),
        Arc::new(FixedLocationProvider::new(
            PermissionState::Granted,
            Some("Oslo".to_string()),
        )),
    );
    assert!(!vm.use_location());
    assert_eq!(vm.location_description().unwrap(), "Location is off");

    vm.set_use_location(true).unwrap();
    assert!(vm.use_location());
    assert_eq!(vm.location_description().unwrap(), "Current location: Oslo");
    assert!(vm.with_store(|store| store.load_settings().unwrap()).use_location);

    vm.set_use_location(false).unwrap();
    assert_eq!(vm.location_description().unwrap(), "Location is off");
}

#[test]
fn denied_location_is_described() {
    let vm = view_model();
    vm.set_use_location(true).unwrap();
    assert!(vm.use_location());
    assert_eq!(
        vm.location_description().unwrap(),
        "Location permission denied"
    );
}

#[test]
fn settings_changes_do_not_clobber_encryption_flag() {
    let vm = view_model();
    vm.set_encrypted(true).unwrap();
    vm.set_appearance(Appearance::Dark).unwrap();
    vm.set_use_location(true).unwrap();

    let settings = vm.with_store(|store| store.load_settings().unwrap());
    assert_eq!(
        settings,
        Settings {
            appearance: Appearance::Dark,
            encrypted: true,
            use_location: true,
        }
    );
}

#[test]
fn observers_see_version_bumps() {
    let vm = view_model();
    let mut changes = vm.subscribe();
    vm.items().unwrap();
    let start = vm.version();

    vm.add_item().unwrap();
    assert!(changes.has_changed().unwrap());
    assert!(*changes.borrow_and_update() > start);

    vm.set_filter("same");
    let after_filter = vm.version();
    vm.set_filter("same");
    assert_eq!(vm.version(), after_filter);
}

#[test]
fn snapshot_reflects_observable_fields() {
    let vm = view_model();
    let note = add_note(&vm, "hello", "world");
    vm.set_filter("HELLO");

    let snapshot = vm.snapshot().unwrap();
    assert_eq!(snapshot.items, vec![note]);
    assert_eq!(snapshot.filter, "HELLO");
    assert!(!snapshot.encrypted);
    assert!(!snapshot.crypting);
    assert!(!snapshot.use_location);
    assert_eq!(snapshot.location_description, "Location is off");
}

#[tokio::test(flavor = "multi_thread")]
async fn spawned_pass_runs_off_thread() {
    let vm = view_model();
    let note = add_note(&vm, "background", "");

    let handle = vm.spawn_set_encrypted(true).unwrap();
    assert!(vm.encrypted());

    handle.await.unwrap().unwrap();
    assert_eq!(vm.encryption_state(), EncryptionState::Encrypted);
    assert_eq!(vm.items().unwrap(), vec![note]);
    assert!(stored_rows(&vm).iter().all(|row| row.encrypted));
}
