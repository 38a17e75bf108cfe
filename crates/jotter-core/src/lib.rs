//! jotter-core - Core library for Jotter
//!
//! This crate contains the note model, the `SQLite` store, field-level
//! encryption, secret and location capabilities, and the view-model that
//! list/detail/settings front ends bind to.

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod location;
pub mod models;
pub mod secrets;
pub mod state;
pub mod util;
pub mod view_model;

pub use error::{Error, Result};
pub use models::{Note, NoteId};
pub use view_model::{ViewModel, ViewSnapshot};
