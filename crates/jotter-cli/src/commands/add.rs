use jotter_core::Note;

use crate::commands::common::{read_piped_stdin, NotesViewModel};
use crate::error::CliError;

pub fn run_add(
    view_model: &NotesViewModel,
    title: Option<String>,
    notes: Option<String>,
    favorite: bool,
) -> Result<Note, CliError> {
    let notes = match notes {
        Some(notes) => Some(notes),
        None => read_piped_stdin()?,
    };

    let mut note = view_model.add_item()?;
    if let Some(title) = title {
        note.title = title.trim().to_string();
    }
    if let Some(notes) = notes {
        note.notes = notes;
    }
    note.favorite = favorite;

    view_model.save(&note)?;
    println!("{}", note.id);
    Ok(note)
}
