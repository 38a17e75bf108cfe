use crate::cli::KeyCommands;
use crate::commands::common::NotesViewModel;
use crate::error::CliError;

pub fn run_key(view_model: &NotesViewModel, command: &KeyCommands) -> Result<(), CliError> {
    match command {
        KeyCommands::Status => {
            let stored = if view_model.secrets().has_key()? {
                "stored"
            } else {
                "not stored"
            };
            println!("key:         {stored}");
            println!("encryption:  {:?}", view_model.encryption_state());
        }
        KeyCommands::Forget => {
            view_model.forget_key()?;
            println!("Encryption key deleted");
        }
    }
    Ok(())
}
