use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use jotter_core::models::Appearance;

#[derive(Parser)]
#[command(name = "jotter")]
#[command(about = "Keep short notes, optionally encrypted at rest")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Quick capture: jotter "my note title"
    #[arg(trailing_var_arg = true)]
    pub note: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List notes in display order
    #[command(alias = "ls")]
    List {
        /// Only show notes whose title or body contains this text
        #[arg(short, long)]
        filter: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new note at the top of the list
    #[command(alias = "new")]
    Add {
        /// Note title
        #[arg(short, long)]
        title: Option<String>,
        /// Note body (read from stdin when piped)
        #[arg(short, long)]
        notes: Option<String>,
        /// Mark the note as a favorite
        #[arg(long)]
        favorite: bool,
    },
    /// Show a single note
    Show {
        /// List position (1-based) or ID prefix
        note: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing note (opens $EDITOR when no field is given)
    Edit {
        /// List position (1-based) or ID prefix
        note: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        /// Set or clear the favorite flag
        #[arg(long, value_name = "BOOL")]
        favorite: Option<bool>,
        /// Note date, RFC 3339 or YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
    /// Delete notes by list position
    #[command(alias = "rm")]
    Delete {
        /// List positions (1-based)
        #[arg(required = true)]
        positions: Vec<usize>,
        /// Positions refer to the list filtered by this text
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Move notes to a new list position
    Move {
        /// List positions to move (1-based)
        #[arg(required = true)]
        positions: Vec<usize>,
        /// Destination position, counted before the move; one past the end appends
        #[arg(long)]
        to: usize,
        /// Positions refer to the list filtered by this text
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Turn at-rest encryption on or off
    Encrypt {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Turn location use on or off
    Location {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Show current settings
    Settings {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change the appearance preference
    Appearance {
        #[arg(value_enum)]
        value: Option<AppearanceChoice>,
    },
    /// Inspect or forget the encryption key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum AppearanceChoice {
    System,
    Light,
    Dark,
}

impl From<AppearanceChoice> for Appearance {
    fn from(choice: AppearanceChoice) -> Self {
        match choice {
            AppearanceChoice::System => Self::System,
            AppearanceChoice::Light => Self::Light,
            AppearanceChoice::Dark => Self::Dark,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Show whether a key is stored and whether notes use it
    Status,
    /// Delete the stored key (only when no note is encrypted)
    Forget,
}
