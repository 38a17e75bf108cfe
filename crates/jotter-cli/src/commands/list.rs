use crate::commands::common::{format_note_lines, note_to_list_item, NotesViewModel, NoteListItem};
use crate::error::CliError;

pub fn run_list(
    view_model: &NotesViewModel,
    filter: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    view_model.set_filter(filter.unwrap_or_default());
    let notes = view_model.items()?;

    if as_json {
        let json_items = notes
            .iter()
            .enumerate()
            .map(|(index, note)| note_to_list_item(index + 1, note))
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
