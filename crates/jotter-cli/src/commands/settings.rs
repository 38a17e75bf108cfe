use jotter_core::models::Appearance;
use jotter_core::state::EncryptionState;
use serde::Serialize;

use crate::commands::common::NotesViewModel;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub appearance: Appearance,
    pub encrypted: bool,
    pub encryption_state: EncryptionState,
    pub use_location: bool,
    pub location_description: String,
    pub note_count: usize,
}

pub fn settings_view(view_model: &NotesViewModel) -> Result<SettingsView, CliError> {
    let snapshot = view_model.snapshot()?;
    Ok(SettingsView {
        appearance: snapshot.appearance,
        encrypted: snapshot.encrypted,
        encryption_state: snapshot.encryption_state,
        use_location: snapshot.use_location,
        location_description: snapshot.location_description,
        note_count: snapshot.items.len(),
    })
}

pub fn run_settings(view_model: &NotesViewModel, as_json: bool) -> Result<(), CliError> {
    let view = settings_view(view_model)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("appearance:  {}", view.appearance);
        println!("encryption:  {}", on_off(view.encrypted));
        println!("location:    {} ({})", on_off(view.use_location), view.location_description);
        println!("notes:       {}", view.note_count);
    }
    Ok(())
}

pub fn run_appearance(
    view_model: &NotesViewModel,
    value: Option<Appearance>,
) -> Result<Appearance, CliError> {
    if let Some(appearance) = value {
        view_model.set_appearance(appearance)?;
    }
    let appearance = view_model.appearance()?;
    println!("{appearance}");
    Ok(appearance)
}

const fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
