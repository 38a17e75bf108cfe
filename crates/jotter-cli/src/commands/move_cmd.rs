use crate::commands::common::{positions_to_offsets, NotesViewModel};
use crate::error::CliError;

pub fn run_move(
    view_model: &NotesViewModel,
    positions: &[usize],
    to: usize,
    filter: Option<&str>,
) -> Result<(), CliError> {
    view_model.set_filter(filter.unwrap_or_default());
    let visible = view_model.items()?.len();
    let offsets = positions_to_offsets(positions, visible)?;

    // The destination may sit one past the last row.
    if to == 0 || to > visible + 1 {
        return Err(CliError::InvalidPosition {
            position: to,
            len: visible + 1,
        });
    }

    view_model.move_items(&offsets, to - 1)?;
    Ok(())
}
