//! Database layer for Jotter

mod connection;
mod migrations;
mod repository;
mod settings_repository;

pub use connection::Database;
pub use repository::{NoteStore, SqliteNoteStore, StoredNote};
pub use settings_repository::{SettingsRepository, SettingsStore, SqliteSettingsRepository};
