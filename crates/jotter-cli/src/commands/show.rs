use crate::commands::common::{format_timestamp, resolve_note, NotesViewModel};
use crate::error::CliError;

pub fn run_show(view_model: &NotesViewModel, note_query: &str, as_json: bool) -> Result<(), CliError> {
    let note = resolve_note(view_model, note_query)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    let star = if note.favorite { " *" } else { "" };
    println!("{}{star}", note.display_title());
    println!("{}  {}", note.id, format_timestamp(note.date));
    if !note.notes.is_empty() {
        println!();
        println!("{}", note.notes);
    }
    Ok(())
}
