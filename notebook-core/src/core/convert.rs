//! Changing a note's kind while keeping its identity.
//!
//! [`convert`] is pure: it reads the old note and returns a new value. The
//! caller owns the swap of the live object (see
//! [`NotebookContext::convert`](crate::NotebookContext::convert)), so a failed
//! conversion leaves the original note exactly as it was.
//!
//! | from \ to | text           | code                      | picture |
//! |-----------|----------------|---------------------------|---------|
//! | text      | recolor        | body kept, `python`       | error   |
//! | code      | body kept      | recolor                   | error   |
//! | picture   | empty body     | empty body, `python`      | recolor |

use crate::{Note, NoteColor, NoteContent, NoteKind, NotebookError, Result, DEFAULT_LANGUAGE};

/// Whether `from -> to` has a data-preserving mapping.
#[must_use]
pub fn can_convert(from: NoteKind, to: NoteKind) -> bool {
    from == to || to != NoteKind::Picture
}

/// Builds a copy of `note` as a `target` note colored `color`.
///
/// Identity (`id`, `note_file`), geometry, title, id tag, parent link,
/// description, instructions and timestamps carry over unchanged. Text and
/// code bodies transfer verbatim; entering code attaches
/// [`DEFAULT_LANGUAGE`] and leaving it drops the language. Leaving picture
/// kind drops the image and its annotations.
///
/// Converting to the note's own kind only applies the new color. Unsaved
/// notes stay unsaved: no id is ever generated here.
///
/// # Errors
///
/// Returns [`NotebookError::UnsupportedConversion`] when a text or code note
/// is asked to become a picture; there is no image to give it.
pub fn convert(note: &Note, target: NoteKind, color: NoteColor) -> Result<Note> {
    let from = note.kind();
    let content = if from == target {
        note.content.clone()
    } else {
        let body = note.body().unwrap_or_default().to_string();
        match target {
            NoteKind::Text => NoteContent::Text { body },
            NoteKind::Code => NoteContent::Code {
                body,
                language: DEFAULT_LANGUAGE.to_string(),
            },
            NoteKind::Picture => {
                return Err(NotebookError::UnsupportedConversion { from, to: target })
            }
        }
    };

    log::debug!(
        "Converting note {} from {from} to {target} ({color})",
        note.id.as_deref().unwrap_or("<unsaved>")
    );

    Ok(Note {
        color,
        content,
        ..note.clone()
    })
}
