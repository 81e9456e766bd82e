//! Error types for the Note Book core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::NoteKind;

/// All errors that can occur within the Note Book core library.
#[derive(Debug, Error)]
pub enum NotebookError {
    /// The requested kind transition has no data-preserving mapping.
    #[error("Cannot convert a {from} note into a {to} note")]
    UnsupportedConversion {
        /// Kind of the note before the conversion.
        from: NoteKind,
        /// Kind that was requested.
        to: NoteKind,
    },

    /// A note ID was requested that has no stored document.
    #[error("Note not found: {0}")]
    NotFound(String),

    /// A Note File name is not present in the notebook index.
    #[error("Note File not found: {0}")]
    NoteFileNotFound(String),

    /// A Note File name was empty or already taken.
    #[error("Invalid Note File name: {0}")]
    InvalidNoteFile(String),

    /// A stored JSON document could not be parsed or lacks required keys.
    #[error("Malformed document {}: {reason}", path.display())]
    MalformedPersisted {
        /// File that failed to load.
        path: PathBuf,
        /// Parser or validation message.
        reason: String,
    },

    /// An external tool (the spell checker) is not installed.
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    /// An external tool did not finish within its time limit.
    #[error("Tool timed out: {0}")]
    ToolTimedOut(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be serialized or deserialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An image could not be decoded or encoded.
    #[error("Image error: {0}")]
    Image(String),
}

impl From<image::ImageError> for NotebookError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

/// Convenience alias that pins the error type to [`NotebookError`].
pub type Result<T> = std::result::Result<T, NotebookError>;

impl NotebookError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedConversion { from, to } => {
                format!("A {from} note cannot be converted into a {to} note")
            }
            Self::NotFound(_) => "Note no longer exists".to_string(),
            Self::NoteFileNotFound(name) => format!("Note File '{name}' no longer exists"),
            Self::InvalidNoteFile(msg) => msg.clone(),
            Self::MalformedPersisted { path, .. } => {
                format!("Could not read {}", path.display())
            }
            Self::ToolUnavailable(_) => {
                "Spell checker not available.\nInstall 'aspell' for spell checking.".to_string()
            }
            Self::ToolTimedOut(_) => "Spell check timed out.".to_string(),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Image(e) => format!("Image error: {e}"),
        }
    }

    /// Whether the caller should skip the affected entry and carry on.
    ///
    /// Recoverable errors are reported to the user as a notice; nothing in
    /// this crate treats any error as fatal to the process.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::NoteFileNotFound(_)
                | Self::MalformedPersisted { .. }
                | Self::ToolUnavailable(_)
                | Self::ToolTimedOut(_)
        )
    }
}
