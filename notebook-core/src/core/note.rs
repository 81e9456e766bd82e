//! The persisted note entity: text, code and picture notes.
//!
//! A note's kind lives in [`NoteContent`], so the fields that only make sense
//! for one kind (a code note's `language`, a picture note's `image_path` and
//! annotations) cannot exist on a note of another kind.
//!
//! On disk a note is a flat JSON object. [`Note`] serializes through a private
//! record type that also understands the older document shapes: kind flags
//! instead of a `kind` key, `text` instead of `body`, `text_boxes` instead of
//! `annotations`, and naive `created` timestamps.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::{NoteColor, TextBox};

/// Language attached to a note the first time it becomes a code note.
pub const DEFAULT_LANGUAGE: &str = "python";

/// Default window size of a freshly created note.
pub const DEFAULT_NOTE_SIZE: i32 = 300;

/// The three note kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Text,
    Code,
    Picture,
}

impl NoteKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Code => "code",
            Self::Picture => "picture",
        }
    }
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "code" => Ok(Self::Code),
            "picture" => Ok(Self::Picture),
            _ => Err(format!("Unknown note kind: {s}")),
        }
    }
}

/// Window position and size of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 100,
            y: 100,
            width: DEFAULT_NOTE_SIZE,
            height: DEFAULT_NOTE_SIZE,
        }
    }
}

impl Geometry {
    /// The same size shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// Kind-specific payload of a note.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteContent {
    /// Plain text.
    Text { body: String },
    /// Source code shown with syntax highlighting for `language`.
    Code { body: String, language: String },
    /// An image with text-box annotations drawn over it.
    Picture {
        image_path: String,
        annotations: Vec<TextBox>,
    },
}

impl NoteContent {
    #[must_use]
    pub fn kind(&self) -> NoteKind {
        match self {
            Self::Text { .. } => NoteKind::Text,
            Self::Code { .. } => NoteKind::Code,
            Self::Picture { .. } => NoteKind::Picture,
        }
    }
}

/// A single note of any kind.
///
/// `id` is assigned by [`Store::save_note`](crate::Store::save_note) on the
/// first save and never changes afterwards, even across kind conversions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "NoteRecord", try_from = "NoteRecord")]
pub struct Note {
    pub id: Option<String>,
    pub note_file: Option<String>,
    pub color: NoteColor,
    pub geometry: Geometry,
    pub title: String,
    pub id_tag: Option<String>,
    pub parent_id: Option<String>,
    pub description: String,
    pub instructions: String,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub content: NoteContent,
}

impl Note {
    fn with_content(content: NoteContent) -> Self {
        Self {
            id: None,
            note_file: None,
            color: NoteColor::default(),
            geometry: Geometry::default(),
            title: String::new(),
            id_tag: None,
            parent_id: None,
            description: String::new(),
            instructions: String::new(),
            created_at: None,
            modified_at: None,
            content,
        }
    }

    /// A new, unsaved text note.
    pub fn new_text(body: impl Into<String>) -> Self {
        Self::with_content(NoteContent::Text { body: body.into() })
    }

    /// A new, unsaved code note.
    pub fn new_code(body: impl Into<String>, language: impl Into<String>) -> Self {
        Self::with_content(NoteContent::Code {
            body: body.into(),
            language: language.into(),
        })
    }

    /// A new, unsaved picture note titled after the image's file name.
    pub fn new_picture(image_path: impl Into<String>) -> Self {
        let image_path = image_path.into();
        let title = Path::new(&image_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let mut note = Self::with_content(NoteContent::Picture {
            image_path,
            annotations: Vec::new(),
        });
        note.title = title;
        note
    }

    /// A blank note of `kind` (pictures need an image, so they get an empty path).
    pub fn blank(kind: NoteKind) -> Self {
        match kind {
            NoteKind::Text => Self::new_text(""),
            NoteKind::Code => Self::new_code("", DEFAULT_LANGUAGE),
            NoteKind::Picture => Self::new_picture(""),
        }
    }

    #[must_use]
    pub fn kind(&self) -> NoteKind {
        self.content.kind()
    }

    /// Whether the note has been saved at least once.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    /// Text body of a text or code note.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match &self.content {
            NoteContent::Text { body } | NoteContent::Code { body, .. } => Some(body),
            NoteContent::Picture { .. } => None,
        }
    }

    /// Replaces the body; returns `false` for picture notes, which have none.
    pub fn set_body(&mut self, text: impl Into<String>) -> bool {
        match &mut self.content {
            NoteContent::Text { body } | NoteContent::Code { body, .. } => {
                *body = text.into();
                true
            }
            NoteContent::Picture { .. } => false,
        }
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        match &self.content {
            NoteContent::Code { language, .. } => Some(language),
            _ => None,
        }
    }

    /// Sets the highlighting language of a code note; ignored for other kinds.
    pub fn set_language(&mut self, new_language: impl Into<String>) -> bool {
        match &mut self.content {
            NoteContent::Code { language, .. } => {
                *language = new_language.into();
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn image_path(&self) -> Option<&str> {
        match &self.content {
            NoteContent::Picture { image_path, .. } => Some(image_path),
            _ => None,
        }
    }

    #[must_use]
    pub fn annotations(&self) -> Option<&[TextBox]> {
        match &self.content {
            NoteContent::Picture { annotations, .. } => Some(annotations),
            _ => None,
        }
    }

    pub fn annotations_mut(&mut self) -> Option<&mut Vec<TextBox>> {
        match &mut self.content {
            NoteContent::Picture { annotations, .. } => Some(annotations),
            _ => None,
        }
    }

    /// Sets or clears the id tag; blank input clears it.
    pub fn set_id_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        self.id_tag = (!tag.is_empty()).then(|| tag.to_string());
    }

    /// One-line label for note lists: the title, else the start of the body.
    #[must_use]
    pub fn preview(&self, limit: usize) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }
        let body = self.body().unwrap_or_default();
        if body.is_empty() {
            return "(Empty note)".to_string();
        }
        if body.chars().count() > limit {
            let head: String = body.chars().take(limit).collect();
            format!("{head}...")
        } else {
            body.to_string()
        }
    }

    /// Serializes the note to its on-disk JSON mapping.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotebookError::Json`] if serialization fails.
    pub fn to_value(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuilds a note from its JSON mapping, defaulting missing optional keys.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotebookError::Json`] if the mapping is not a note
    /// document (for instance a picture note without `image_path`).
    pub fn from_value(value: serde_json::Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Flat JSON shape of a note document, old and new keys alike.
#[derive(Debug, Default, Serialize, Deserialize)]
struct NoteRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<NoteKind>,
    #[serde(default, rename = "type", skip_serializing)]
    legacy_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note_file: Option<String>,
    #[serde(default)]
    color: NoteColor,
    #[serde(default)]
    x: Option<i32>,
    #[serde(default)]
    y: Option<i32>,
    #[serde(default)]
    width: Option<i32>,
    #[serde(default)]
    height: Option<i32>,
    #[serde(default)]
    title: String,
    #[serde(default, alias = "text", skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_path: Option<String>,
    #[serde(default, alias = "text_boxes", skip_serializing_if = "Option::is_none")]
    annotations: Option<Vec<TextBox>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id_tag: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    instructions: String,
    #[serde(default, alias = "created", skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified_at: Option<String>,
    #[serde(default)]
    is_code_note: bool,
    #[serde(default)]
    is_picture_note: bool,
}

impl From<Note> for NoteRecord {
    fn from(note: Note) -> Self {
        let kind = note.kind();
        let mut record = NoteRecord {
            kind: Some(kind),
            id: note.id,
            note_file: note.note_file,
            color: note.color,
            x: Some(note.geometry.x),
            y: Some(note.geometry.y),
            width: Some(note.geometry.width),
            height: Some(note.geometry.height),
            title: note.title,
            id_tag: note.id_tag.map(serde_json::Value::String),
            parent_id: note.parent_id,
            description: note.description,
            instructions: note.instructions,
            created_at: note.created_at.map(|t| t.to_rfc3339()),
            modified_at: note.modified_at.map(|t| t.to_rfc3339()),
            is_code_note: kind == NoteKind::Code,
            is_picture_note: kind == NoteKind::Picture,
            ..Default::default()
        };
        match note.content {
            NoteContent::Text { body } => record.body = Some(body),
            NoteContent::Code { body, language } => {
                record.body = Some(body);
                record.language = Some(language);
            }
            NoteContent::Picture {
                image_path,
                annotations,
            } => {
                record.image_path = Some(image_path);
                record.annotations = Some(annotations);
            }
        }
        record
    }
}

impl TryFrom<NoteRecord> for Note {
    type Error = String;

    fn try_from(record: NoteRecord) -> Result<Self, Self::Error> {
        let kind = record.kind.unwrap_or({
            if record.is_picture_note || record.legacy_type.as_deref() == Some("picture") {
                NoteKind::Picture
            } else if record.is_code_note {
                NoteKind::Code
            } else {
                NoteKind::Text
            }
        });

        let content = match kind {
            NoteKind::Text => NoteContent::Text {
                body: record.body.unwrap_or_default(),
            },
            NoteKind::Code => NoteContent::Code {
                body: record.body.unwrap_or_default(),
                language: record
                    .language
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            },
            NoteKind::Picture => NoteContent::Picture {
                image_path: record
                    .image_path
                    .ok_or_else(|| "picture note is missing `image_path`".to_string())?,
                annotations: record.annotations.unwrap_or_default(),
            },
        };

        let defaults = Geometry::default();
        Ok(Note {
            id: non_empty(record.id),
            note_file: non_empty(record.note_file),
            color: record.color,
            geometry: Geometry {
                x: record.x.unwrap_or(defaults.x),
                y: record.y.unwrap_or(defaults.y),
                width: record.width.unwrap_or(defaults.width),
                height: record.height.unwrap_or(defaults.height),
            },
            title: record.title,
            id_tag: record.id_tag.and_then(tag_text),
            parent_id: non_empty(record.parent_id),
            description: record.description,
            instructions: record.instructions,
            created_at: record.created_at.as_deref().and_then(parse_timestamp),
            modified_at: record.modified_at.as_deref().and_then(parse_timestamp),
            content,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Id tags were typed into a free-form entry; older files may hold numbers.
fn tag_text(value: serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(Utc.from_utc_datetime(&naive)),
        Err(e) => {
            log::warn!("Ignoring unreadable timestamp '{raw}': {e}");
            None
        }
    }
}
