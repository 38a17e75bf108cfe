//! Settings repository implementation

use crate::error::Result;
use crate::models::Settings;
use rusqlite::{params, Connection, OptionalExtension};

use super::{SqliteNoteStore, StoredNote};

/// Trait for settings storage operations
pub trait SettingsRepository {
    /// Load settings from the database
    fn load(&self) -> Result<Settings>;

    /// Save settings to the database
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Stores that can also persist [`Settings`]
pub trait SettingsStore {
    fn load_settings(&self) -> Result<Settings>;

    fn save_settings(&mut self, settings: &Settings) -> Result<()>;

    /// Commit an encryption pass: rewrite `rows` and save `settings` in one
    /// transaction.
    ///
    /// A row is only rewritten while its stored marker still equals
    /// `expected_encrypted`. Either every change lands or none does.
    /// Returns the number of rows rewritten.
    fn commit_pass(
        &mut self,
        rows: &[StoredNote],
        expected_encrypted: bool,
        settings: &Settings,
    ) -> Result<usize>;
}

/// `SQLite` implementation of `SettingsRepository`
pub struct SqliteSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn load(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(value) = self.get_setting("appearance")? {
            match value.parse() {
                Ok(appearance) => settings.appearance = appearance,
                Err(error) => tracing::warn!("Ignoring stored appearance: {error}"),
            }
        }

        if let Some(value) = self.get_setting("encrypted")? {
            settings.encrypted = parse_flag(&value);
        }

        if let Some(value) = self.get_setting("use_location")? {
            settings.use_location = parse_flag(&value);
        }

        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        self.set_setting("appearance", settings.appearance.as_str())?;
        self.set_setting("encrypted", if settings.encrypted { "true" } else { "false" })?;
        self.set_setting(
            "use_location",
            if settings.use_location { "true" } else { "false" },
        )?;
        Ok(())
    }
}

impl SettingsStore for SqliteNoteStore {
    fn load_settings(&self) -> Result<Settings> {
        SqliteSettingsRepository::new(self.database().connection()).load()
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<()> {
        SqliteSettingsRepository::new(self.database().connection()).save(settings)
    }

    fn commit_pass(
        &mut self,
        rows: &[StoredNote],
        expected_encrypted: bool,
        settings: &Settings,
    ) -> Result<usize> {
        self.commit_rewrites(rows, expected_encrypted, settings)
    }
}
