use crate::commands::common::{positions_to_offsets, NotesViewModel};
use crate::error::CliError;

pub fn run_delete(
    view_model: &NotesViewModel,
    positions: &[usize],
    filter: Option<&str>,
) -> Result<usize, CliError> {
    view_model.set_filter(filter.unwrap_or_default());
    let visible = view_model.items()?.len();
    let offsets = positions_to_offsets(positions, visible)?;

    let removed = view_model.remove(&offsets)?;
    println!("Deleted {removed} note(s)");
    Ok(removed)
}
