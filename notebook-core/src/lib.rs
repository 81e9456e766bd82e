//! Core library for Note Book, a sticky-notes style notebook of text, code and
//! annotated picture notes.
//!
//! A notebook is a directory holding `notebook.json` (the Note File index) and
//! one JSON document per note. [`Store`] owns that directory; every persisted
//! mutation goes through it. [`NotebookContext`] holds the per-session state
//! (selected Note File, open notes) and performs kind conversions on open
//! notes via [`convert`].
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    color::NoteColor,
    context::{NoteHandle, NotebookContext},
    convert::{can_convert, convert},
    error::{NotebookError, Result},
    fill::{fill_image_file, flood_fill, DEFAULT_FILL_TOLERANCE},
    hierarchy::{build_hierarchy, HierarchyEntry},
    index::{NoteFileMetadata, NotebookIndex, TagConfig},
    note::{Geometry, Note, NoteContent, NoteKind, DEFAULT_LANGUAGE, DEFAULT_NOTE_SIZE},
    picture::{hit_test, Handle, TextBox, TextBoxKind, MIN_TEXT_BOX_HEIGHT, MIN_TEXT_BOX_WIDTH},
    settings::{
        load_settings, load_settings_from, save_settings, save_settings_to, settings_file_path,
        NotebookSettings,
    },
    spellcheck::SpellChecker,
    store::{NoteMetadataUpdate, Store, StoreEvent, INDEX_FILE_NAME},
};
