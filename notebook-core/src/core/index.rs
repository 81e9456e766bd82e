//! The `notebook.json` index: Note File names, their ordered note ids and
//! per-file metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::NoteColor;

/// Description and instructions attached to one color or one id tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagConfig {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
}

impl TagConfig {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.instructions.is_empty()
    }
}

/// Metadata of a single Note File.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFileMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    /// Keyed by color storage name.
    #[serde(default)]
    pub color_config: BTreeMap<String, TagConfig>,
    /// Keyed by id tag.
    #[serde(default)]
    pub number_config: BTreeMap<String, TagConfig>,
}

impl NoteFileMetadata {
    /// Config for `color`, empty when none was entered.
    #[must_use]
    pub fn color(&self, color: NoteColor) -> TagConfig {
        self.color_config.get(color.name()).cloned().unwrap_or_default()
    }
}

/// A `note_files` value as found on disk.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileEntryRepr {
    /// Old shape: the id list itself.
    Flat(Vec<String>),
    /// Newer shape: an object carrying the list under `notes`.
    Nested {
        notes: Vec<String>,
        #[serde(default)]
        description: String,
        #[serde(default)]
        instructions: String,
    },
    Unknown(serde_json::Value),
}

#[derive(Debug, Default, Deserialize)]
struct IndexRepr {
    #[serde(default)]
    note_files: BTreeMap<String, FileEntryRepr>,
    #[serde(default)]
    note_file_metadata: BTreeMap<String, NoteFileMetadata>,
}

/// In-memory form of `notebook.json`.
///
/// Every file present in `note_files` also has a metadata entry, so lookups
/// never need to special-case files created by older versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotebookIndex {
    pub note_files: BTreeMap<String, Vec<String>>,
    pub note_file_metadata: BTreeMap<String, NoteFileMetadata>,
}

impl NotebookIndex {
    /// Parses `notebook.json`, accepting both the flat and the nested
    /// `note_files` shapes.
    ///
    /// Entries of any other shape load as empty files rather than failing the
    /// whole notebook.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotebookError::Json`] if `json` is not a JSON object
    /// of the expected top-level shape.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let raw: IndexRepr = serde_json::from_str(json)?;
        let mut index = NotebookIndex {
            note_files: BTreeMap::new(),
            note_file_metadata: raw.note_file_metadata,
        };

        for (name, entry) in raw.note_files {
            let ids = match entry {
                FileEntryRepr::Flat(ids) => ids,
                FileEntryRepr::Nested {
                    notes,
                    description,
                    instructions,
                } => {
                    let meta = index.note_file_metadata.entry(name.clone()).or_default();
                    if meta.description.is_empty() {
                        meta.description = description;
                    }
                    if meta.instructions.is_empty() {
                        meta.instructions = instructions;
                    }
                    notes
                }
                FileEntryRepr::Unknown(value) => {
                    log::warn!("Note File '{name}' has an unreadable entry ({value}); starting it empty");
                    Vec::new()
                }
            };
            index.note_files.insert(name, ids);
        }

        let files: Vec<String> = index.note_files.keys().cloned().collect();
        for name in files {
            index.note_file_metadata.entry(name).or_default();
        }
        Ok(index)
    }

    /// Pretty-printed `notebook.json` in the flat shape.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotebookError::Json`] if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn ids(&self, file: &str) -> Option<&[String]> {
        self.note_files.get(file).map(Vec::as_slice)
    }

    /// The file whose list contains `id`, if any.
    #[must_use]
    pub fn file_of(&self, id: &str) -> Option<&str> {
        self.note_files
            .iter()
            .find(|(_, ids)| ids.iter().any(|i| i == id))
            .map(|(name, _)| name.as_str())
    }
}
