//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::util::unix_millis_now;

/// Title shown for a note whose title and body are both blank
pub const UNTITLED_NOTE: &str = "New Note";

/// A unique identifier for a note, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Short title, may be empty
    pub title: String,
    /// Body text, may be empty
    pub notes: String,
    /// Starred in the list
    pub favorite: bool,
    /// User-editable date (Unix ms)
    pub date: i64,
}

impl Note {
    /// Create an empty note stamped with the current time
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NoteId::new(),
            title: String::new(),
            notes: String::new(),
            favorite: false,
            date: unix_millis_now(),
        }
    }

    /// Builder-style title setter
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder-style body setter
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Compare the user-editable fields, ignoring the id
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.title == other.title
            && self.notes == other.notes
            && self.favorite == other.favorite
            && self.date == other.date
    }

    /// Case-insensitive substring match over `title` followed directly by
    /// `notes`.
    ///
    /// The filter is used as typed; only the empty filter matches everything.
    #[must_use]
    pub fn matches_filter(&self, filter: &str) -> bool {
        if filter.is_empty() {
            return true;
        }
        let haystack = format!("{}{}", self.title, self.notes).to_lowercase();
        haystack.contains(&filter.to_lowercase())
    }

    /// Title used for list rows
    ///
    /// `"title: notes"` when both are present, otherwise whichever is present,
    /// otherwise [`UNTITLED_NOTE`].
    #[must_use]
    pub fn display_title(&self) -> String {
        let title = self.title.trim();
        let notes = self.notes.trim();

        match (title.is_empty(), notes.is_empty()) {
            (false, false) => format!("{title}: {notes}"),
            (false, true) => title.to_string(),
            (true, false) => notes.to_string(),
            (true, true) => UNTITLED_NOTE.to_string(),
        }
    }

    /// Check if both title and body are blank
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.notes.trim().is_empty()
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}
