use crate::commands::common::NotesViewModel;
use crate::error::CliError;

pub async fn run_encrypt(view_model: &NotesViewModel, enabled: bool) -> Result<(), CliError> {
    let handle = view_model.spawn_set_encrypted(enabled)?;
    println!("{:?}...", view_model.encryption_state());

    handle.await??;

    let state = if view_model.encrypted() { "on" } else { "off" };
    println!("Encryption {state}");
    Ok(())
}
