//! Jotter CLI - Command-line front end for the notes view-model
//!
//! Lists, edits and reorders notes and drives the encryption and location
//! settings from the terminal.

mod cli;
mod commands;
mod error;


use clap::{CommandFactory, Parser};
use jotter_core::util::normalize_text_option;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::{load_config, open_view_model, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, NoteEdits};
use crate::commands::encrypt::run_encrypt;
use crate::commands::key::run_key;
use crate::commands::list::run_list;
use crate::commands::location::run_location;
use crate::commands::move_cmd::run_move;
use crate::commands::settings::{run_appearance, run_settings};
use crate::commands::show::run_show;
use crate::error::CliError;

const DEFAULT_LOG_DIRECTIVE: &str = "jotter=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = load_config()?;
    init_tracing(config.log_filter.as_deref())?;

    if let Some(Commands::Completions { shell, output }) = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let db_path = resolve_db_path(cli.db_path, &config)?;
    let view_model = open_view_model(&db_path, &config)?;

    match cli.command {
        Some(Commands::List { filter, json }) => run_list(&view_model, filter.as_deref(), json)?,
        Some(Commands::Add {
            title,
            notes,
            favorite,
        }) => {
            run_add(&view_model, title, notes, favorite)?;
        }
        Some(Commands::Show { note, json }) => run_show(&view_model, &note, json)?,
        Some(Commands::Edit {
            note,
            title,
            notes,
            favorite,
            date,
        }) => {
            let edits = NoteEdits {
                title,
                notes,
                favorite,
                date,
            };
            run_edit(&view_model, &note, edits)?;
        }
        Some(Commands::Delete { positions, filter }) => {
            run_delete(&view_model, &positions, filter.as_deref())?;
        }
        Some(Commands::Move {
            positions,
            to,
            filter,
        }) => run_move(&view_model, &positions, to, filter.as_deref())?,
        Some(Commands::Encrypt { state }) => run_encrypt(&view_model, state.is_on()).await?,
        Some(Commands::Location { state }) => run_location(&view_model, state.is_on())?,
        Some(Commands::Settings { json }) => run_settings(&view_model, json)?,
        Some(Commands::Appearance { value }) => {
            run_appearance(&view_model, value.map(Into::into))?;
        }
        Some(Commands::Key { command }) => run_key(&view_model, &command)?,
        Some(Commands::Completions { .. }) => {}
        None => {
            // Quick capture mode: jotter "my note"
            if cli.note.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                run_add(&view_model, Some(cli.note.join(" ")), None, false)?;
            }
        }
    }

    Ok(())
}

fn init_tracing(configured: Option<&str>) -> Result<(), CliError> {
    let directive = normalize_text_option(configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LOG_DIRECTIVE.to_string());
    let directive: Directive = directive
        .parse()
        .map_err(|error| CliError::Config(format!("invalid log filter '{directive}': {error}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
