//! Data models for Jotter

mod note;
mod settings;

pub use note::{Note, NoteId, UNTITLED_NOTE};
pub use settings::{Appearance, Settings};
