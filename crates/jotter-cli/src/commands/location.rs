use crate::commands::common::NotesViewModel;
use crate::error::CliError;

pub fn run_location(view_model: &NotesViewModel, enabled: bool) -> Result<(), CliError> {
    view_model.set_use_location(enabled)?;
    println!("{}", view_model.location_description()?);
    Ok(())
}
