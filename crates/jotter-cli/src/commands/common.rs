use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use jotter_core::config::{JotterConfig, SecretBackend, CONFIG_FILE_NAME};
use jotter_core::db::SqliteNoteStore;
use jotter_core::location::{FixedLocationProvider, LocationProvider};
use jotter_core::secrets::{
    FileSecretStore, KeyringSecretStore, SecretManager, SecretStore, SECRET_SERVICE_NAME,
};
use jotter_core::util::normalize_text_option;
use jotter_core::{Note, NoteId, ViewModel};
use serde::Serialize;

use crate::error::CliError;

pub type NotesViewModel = ViewModel<SqliteNoteStore>;

/// Shorter numeric references are list positions, longer ones ID prefixes
pub const MIN_ID_PREFIX_LEN: usize = 8;

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub position: usize,
    pub id: String,
    pub title: String,
    pub notes: String,
    pub favorite: bool,
    pub date: i64,
    pub date_iso: String,
    pub relative_time: String,
}

pub fn note_to_list_item(position: usize, note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        position,
        id: note.id.to_string(),
        title: note.title.clone(),
        notes: note.notes.clone(),
        favorite: note.favorite,
        date: note.date,
        date_iso: format_timestamp(note.date),
        relative_time: format_relative_time(note.date, now_ms),
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .enumerate()
        .map(|(index, note)| {
            let marker = if note.favorite { '*' } else { ' ' };
            let preview = note_preview(note, 40);
            let relative_time = format_relative_time(note.date, now_ms);
            format!("{:>3}{marker} {preview:<40}  {relative_time}", index + 1)
        })
        .collect()
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let title = note.display_title();
    let first_line = title.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC)
pub fn parse_date(input: &str) -> Result<i64, CliError> {
    let trimmed = input.trim();
    if let Ok(date_time) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Ok(date_time.timestamp_millis());
    }

    chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date_time| date_time.and_utc().timestamp_millis())
        .ok_or_else(|| CliError::InvalidDate(trimmed.to_string()))
}

/// Convert 1-based list positions into view-model offsets
pub fn positions_to_offsets(positions: &[usize], len: usize) -> Result<Vec<usize>, CliError> {
    positions
        .iter()
        .map(|&position| position_to_offset(position, len))
        .collect()
}

pub fn position_to_offset(position: usize, len: usize) -> Result<usize, CliError> {
    if position == 0 || position > len {
        Err(CliError::InvalidPosition { position, len })
    } else {
        Ok(position - 1)
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Resolve a list position, full ID, or unique ID prefix to a note
pub fn resolve_note(view_model: &NotesViewModel, note_query: &str) -> Result<Note, CliError> {
    let note_query = normalize_note_identifier(note_query)?;
    let items = view_model.items()?;

    if note_query.len() < MIN_ID_PREFIX_LEN {
        if let Ok(position) = note_query.parse::<usize>() {
            let offset = position_to_offset(position, items.len())?;
            return items
                .get(offset)
                .cloned()
                .ok_or_else(|| CliError::NoteNotFound(note_query.clone()));
        }
    }

    if let Ok(note_id) = note_query.parse::<NoteId>() {
        if let Some(note) = view_model.item(&note_id)? {
            return Ok(note);
        }
    }

    let matching = items
        .iter()
        .filter(|note| note.id.to_string().starts_with(&note_query))
        .take(3)
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::NoteNotFound(note_query)),
        [note] => Ok((*note).clone()),
        _ => {
            let options = matching
                .iter()
                .map(|note| note.id.to_string().chars().take(13).collect::<String>())
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{note_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// Editor buffer layout: first line is the title, the rest is the body
pub fn render_editor_content(note: &Note) -> String {
    if note.notes.is_empty() {
        format!("{}\n", note.title)
    } else {
        format!("{}\n\n{}\n", note.title, note.notes)
    }
}

pub fn parse_editor_content(content: &str) -> (String, String) {
    let mut lines = content.lines();
    let title = lines.next().unwrap_or("").trim().to_string();
    let notes = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    (title, notes)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let status = Command::new(program).args(parts).arg(file_path).status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("jotter-note-{}-{now}.md", std::process::id()))
}

pub fn config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("jotter").join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("failed to resolve config directory".to_string()))
}

pub fn load_config() -> Result<JotterConfig, CliError> {
    Ok(JotterConfig::load_from_path(&config_path()?)?)
}

/// `--db-path`, then `JOTTER_DB_PATH`, then the config file, then the data dir
pub fn resolve_db_path(
    cli_db_path: Option<PathBuf>,
    config: &JotterConfig,
) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path
        .or_else(|| env::var_os("JOTTER_DB_PATH").map(PathBuf::from))
        .or_else(|| config.database_path.clone())
    {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("jotter").join("jotter.db"))
        .ok_or_else(|| CliError::Config("failed to resolve data directory".to_string()))
}

/// Key file kept beside the database
pub fn secrets_path(db_path: &Path) -> PathBuf {
    db_path.with_file_name("secrets.json")
}

pub fn secret_manager(db_path: &Path, backend: SecretBackend) -> SecretManager {
    let store: Arc<dyn SecretStore> = match backend {
        SecretBackend::File => Arc::new(FileSecretStore::new(secrets_path(db_path))),
        SecretBackend::Keyring => Arc::new(KeyringSecretStore::new(SECRET_SERVICE_NAME)),
    };
    SecretManager::new(store)
}

/// `JOTTER_LOCATION` stands in for a location service on the command line
pub fn location_provider() -> Arc<dyn LocationProvider> {
    match normalize_text_option(env::var("JOTTER_LOCATION").ok()) {
        Some(place) => Arc::new(FixedLocationProvider::granted(place)),
        None => Arc::new(FixedLocationProvider::restricted()),
    }
}

pub fn open_view_model(
    db_path: &Path,
    config: &JotterConfig,
) -> Result<NotesViewModel, CliError> {
    tracing::debug!("Opening notes at {}", db_path.display());
    let store = SqliteNoteStore::open(db_path)?;
    let view_model = ViewModel::new(
        store,
        secret_manager(db_path, config.secret_backend),
        location_provider(),
    );
    view_model.load()?;
    Ok(view_model)
}
