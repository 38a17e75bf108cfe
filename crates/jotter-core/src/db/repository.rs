//! Note repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite stores positions as i64

use crate::error::{Error, Result};
use crate::models::{Note, NoteId, Settings};
use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, SettingsRepository, SqliteSettingsRepository};

/// A note as persisted, with its per-row encryption marker
///
/// When `encrypted` is set, `note.title` and `note.notes` hold sealed text
/// and must be opened with the field cipher before display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNote {
    pub note: Note,
    pub encrypted: bool,
}

impl StoredNote {
    /// Wrap a plaintext note
    pub const fn plain(note: Note) -> Self {
        Self {
            note,
            encrypted: false,
        }
    }

    pub const fn id(&self) -> NoteId {
        self.note.id
    }
}

/// Trait for note storage operations
///
/// Every mutation is durable once the call returns.
pub trait NoteStore {
    /// All notes in store order
    fn list(&self) -> Result<Vec<StoredNote>>;

    /// Get a note by ID
    fn get(&self, id: &NoteId) -> Result<Option<StoredNote>>;

    /// Insert a note at the top of the store order
    fn insert(&mut self, row: &StoredNote) -> Result<NoteId>;

    /// Replace a note's fields; `Error::NotFound` if the id is gone
    fn update(&mut self, row: &StoredNote) -> Result<()>;

    /// Delete notes by id in one transaction, returning how many existed
    fn delete(&mut self, ids: &[NoteId]) -> Result<usize>;

    /// Persist a new store order. Ids not listed keep their relative order
    /// after the listed ones.
    fn reorder(&mut self, ids: &[NoteId]) -> Result<()>;
}

/// `SQLite` implementation of `NoteStore`
pub struct SqliteNoteStore {
    db: Database,
}

impl SqliteNoteStore {
    /// Create a store over an open database
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Fresh in-memory store (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub const fn database(&self) -> &Database {
        &self.db
    }

    fn conn(&self) -> &Connection {
        self.db.connection()
    }

    /// Parse a note from a database row
    fn parse_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredNote> {
        let id: String = row.get(0)?;
        let id = id.parse().map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(error))
        })?;
        Ok(StoredNote {
            note: Note {
                id,
                title: row.get(1)?,
                notes: row.get(2)?,
                favorite: row.get::<_, i32>(3)? != 0,
                date: row.get(4)?,
            },
            encrypted: row.get::<_, i32>(5)? != 0,
        })
    }
}

impl NoteStore for SqliteNoteStore {
    fn list(&self) -> Result<Vec<StoredNote>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, title, notes, favorite, date, encrypted
             FROM notes
             ORDER BY position ASC, rowid ASC",
        )?;

        let rows = stmt
            .query_map([], Self::parse_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn get(&self, id: &NoteId) -> Result<Option<StoredNote>> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, title, notes, favorite, date, encrypted FROM notes WHERE id = ?",
                params![id.as_str()],
                Self::parse_row,
            )
            .optional()?;
        Ok(row)
    }

    fn insert(&mut self, row: &StoredNote) -> Result<NoteId> {
        let note = &row.note;
        self.conn().execute(
            "INSERT INTO notes (id, title, notes, favorite, date, position, encrypted)
             VALUES (?, ?, ?, ?, ?, (SELECT COALESCE(MIN(position), 0) - 1 FROM notes), ?)",
            params![
                note.id.as_str(),
                note.title,
                note.notes,
                i32::from(note.favorite),
                note.date,
                i32::from(row.encrypted)
            ],
        )?;

        tracing::debug!("Inserted note {}", note.id);
        Ok(note.id)
    }

    fn update(&mut self, row: &StoredNote) -> Result<()> {
        let note = &row.note;
        let rows = self.conn().execute(
            "UPDATE notes SET title = ?, notes = ?, favorite = ?, date = ?, encrypted = ? WHERE id = ?",
            params![
                note.title,
                note.notes,
                i32::from(note.favorite),
                note.date,
                i32::from(row.encrypted),
                note.id.as_str()
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(note.id.to_string()));
        }

        tracing::debug!("Updated note {}", note.id);
        Ok(())
    }

    fn delete(&mut self, ids: &[NoteId]) -> Result<usize> {
        let tx = self.db.connection_mut().transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM notes WHERE id = ?")?;
            for id in ids {
                deleted += stmt.execute(params![id.as_str()])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Deleted {deleted} of {} notes", ids.len());
        Ok(deleted)
    }

    fn reorder(&mut self, ids: &[NoteId]) -> Result<()> {
        let tx = self.db.connection_mut().transaction()?;
        {
            // Unlisted rows are pushed after the listed ones, keeping their order
            let offset = ids.len() as i64;
            tx.execute(
                "UPDATE notes SET position = position - (SELECT MIN(position) FROM notes) + ?",
                params![offset],
            )?;

            let mut stmt = tx.prepare("UPDATE notes SET position = ? WHERE id = ?")?;
            for (index, id) in ids.iter().enumerate() {
                stmt.execute(params![index as i64, id.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl SqliteNoteStore {
    /// Rewrite title/notes/marker of many rows and save `settings`, all in
    /// one transaction.
    ///
    /// A row is only rewritten while its stored marker still equals
    /// `expected_encrypted`; rows changed or deleted since the caller read
    /// them are skipped. Returns the number of rows rewritten.
    pub(super) fn commit_rewrites(
        &mut self,
        rows: &[StoredNote],
        expected_encrypted: bool,
        settings: &Settings,
    ) -> Result<usize> {
        let tx = self.db.connection_mut().transaction()?;
        let mut rewritten = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE notes SET title = ?, notes = ?, encrypted = ?
                 WHERE id = ? AND encrypted = ?",
            )?;
            for row in rows {
                rewritten += stmt.execute(params![
                    row.note.title,
                    row.note.notes,
                    i32::from(row.encrypted),
                    row.note.id.as_str(),
                    i32::from(expected_encrypted)
                ])?;
            }
        }
        SqliteSettingsRepository::new(&tx).save(settings)?;
        tx.commit()?;
        Ok(rewritten)
    }
}
