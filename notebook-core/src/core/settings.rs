//! Application settings persistence for Note Book.
//!
//! Stores user preferences (data directory, spell checker, default color) in a
//! JSON file at an OS-appropriate location.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{NoteColor, Result};

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotebookSettings {
    /// Directory holding `notebook.json` and the note documents.
    pub data_directory: PathBuf,
    /// Color given to new notes.
    pub default_color: NoteColor,
    /// Spell checker executable, looked up on `PATH` when not absolute.
    pub spellcheck_binary: String,
    pub spellcheck_timeout_secs: u64,
    /// Maximum number of suggestions offered per misspelled word.
    pub suggestion_limit: usize,
}

impl Default for NotebookSettings {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            default_color: NoteColor::default(),
            spellcheck_binary: "aspell".to_string(),
            spellcheck_timeout_secs: 5,
            suggestion_limit: 10,
        }
    }
}

impl NotebookSettings {
    #[must_use]
    pub fn spellcheck_timeout(&self) -> Duration {
        Duration::from_secs(self.spellcheck_timeout_secs)
    }
}

/// Returns the path to the settings JSON file.
///
/// - macOS / Linux: `~/.config/notebook/settings.json`
/// - Windows: `%APPDATA%/Notebook/settings.json`
pub fn settings_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("Notebook").join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        default_data_directory().join("settings.json")
    }
}

/// Returns the default data directory: `~/.config/notebook`.
pub fn default_data_directory() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Notebook")
    }
    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("notebook")
    }
}

/// Loads settings from the default location.
pub fn load_settings() -> NotebookSettings {
    load_settings_from(&settings_file_path())
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings_from(path: &Path) -> NotebookSettings {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt settings file {}: {e}", path.display());
            NotebookSettings::default()
        }),
        Err(_) => NotebookSettings::default(),
    }
}

/// Saves settings to the default location.
///
/// # Errors
///
/// Returns [`crate::NotebookError::Io`] or [`crate::NotebookError::Json`] if
/// the file cannot be written.
pub fn save_settings(settings: &NotebookSettings) -> Result<()> {
    save_settings_to(&settings_file_path(), settings)
}

/// Saves settings to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`crate::NotebookError::Io`] or [`crate::NotebookError::Json`] if
/// the file cannot be written.
pub fn save_settings_to(path: &Path, settings: &NotebookSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}
