//! Error types for jotter-core

use thiserror::Error;

use crate::models::NoteId;

/// Result type alias using jotter-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in jotter-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// The encryption key could not be read or created
    #[error("Encryption key unavailable: {0}")]
    KeyUnavailable(String),

    /// A single field could not be sealed or opened
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// The bulk encrypt/decrypt pass stopped on a note and was rolled back
    #[error("Encryption pass failed on note {failed}: {source}")]
    EncryptionPass {
        failed: NoteId,
        #[source]
        source: Box<Error>,
    },

    /// A bulk encrypt/decrypt pass is already running
    #[error("An encryption pass is already in progress")]
    EncryptionInProgress,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error means the target row no longer exists.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
