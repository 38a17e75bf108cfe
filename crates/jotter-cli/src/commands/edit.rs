use jotter_core::Note;

use crate::commands::common::{
    capture_editor_input_with_initial, parse_date, parse_editor_content, render_editor_content,
    resolve_note, NotesViewModel,
};
use crate::error::CliError;

/// Field overrides given on the command line
#[derive(Debug, Default)]
pub struct NoteEdits {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub favorite: Option<bool>,
    pub date: Option<String>,
}

impl NoteEdits {
    const fn is_empty(&self) -> bool {
        self.title.is_none() && self.notes.is_none() && self.favorite.is_none() && self.date.is_none()
    }

    fn apply(self, note: &mut Note) -> Result<(), CliError> {
        if let Some(title) = self.title {
            note.title = title.trim().to_string();
        }
        if let Some(notes) = self.notes {
            note.notes = notes;
        }
        if let Some(favorite) = self.favorite {
            note.favorite = favorite;
        }
        if let Some(date) = self.date {
            note.date = parse_date(&date)?;
        }
        Ok(())
    }
}

pub fn run_edit(
    view_model: &NotesViewModel,
    note_query: &str,
    edits: NoteEdits,
) -> Result<bool, CliError> {
    let mut note = resolve_note(view_model, note_query)?;

    if edits.is_empty() {
        let Some(edited) = capture_editor_input_with_initial(&render_editor_content(&note))? else {
            return Err(CliError::EmptyEditedContent);
        };
        let (title, notes) = parse_editor_content(&edited);
        note.title = title;
        note.notes = notes;
    } else {
        edits.apply(&mut note)?;
    }

    if !view_model.is_updated(&note)? {
        println!("{}", note.id);
        return Ok(false);
    }

    if !view_model.save(&note)? {
        return Err(CliError::NoteNotFound(note.id.to_string()));
    }

    println!("{}", note.id);
    Ok(true)
}
