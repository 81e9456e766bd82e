//! Session state shared by the editing surface: the selected Note File and
//! note, and the notes currently open for editing.

use crate::{convert, Geometry, Note, NoteColor, NoteKind, NotebookError, Result, Store};

/// Offset between the windows of successively created notes.
const STAGGER_STEP: i32 = 20;
/// Offset of a duplicate relative to its source.
const DUPLICATE_OFFSET: i32 = 50;
/// Offset of a spawned child relative to its parent.
const CHILD_OFFSET: i32 = 30;

/// Opaque reference to an open note, stable for as long as it stays open.
///
/// Unsaved notes have no id, so open notes are addressed by handle instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteHandle(u64);

/// Explicit replacement for process-wide "current file / open notes" state.
#[derive(Debug, Default)]
pub struct NotebookContext {
    /// Note File that unbound notes are saved into.
    pub current_file: Option<String>,
    /// Id of the note last selected in a note list.
    pub selected_note: Option<String>,
    /// Color given to notes created with [`new_note`](Self::new_note).
    pub default_color: NoteColor,
    open_notes: Vec<(NoteHandle, Note)>,
    next_handle: u64,
}

impl NotebookContext {
    pub fn new(default_color: NoteColor) -> Self {
        Self {
            default_color,
            ..Self::default()
        }
    }

    fn slot(&self, handle: NoteHandle) -> Result<usize> {
        self.open_notes
            .iter()
            .position(|(h, _)| *h == handle)
            .ok_or_else(|| NotebookError::NotFound(format!("open note {}", handle.0)))
    }

    /// Adds `note` to the open notes.
    pub fn open_note(&mut self, note: Note) -> NoteHandle {
        let handle = NoteHandle(self.next_handle);
        self.next_handle += 1;
        log::debug!(
            "Opened {} note {} as handle {}",
            note.kind(),
            note.id.as_deref().unwrap_or("<unsaved>"),
            handle.0
        );
        self.open_notes.push((handle, note));
        handle
    }

    #[must_use]
    pub fn note(&self, handle: NoteHandle) -> Option<&Note> {
        self.open_notes
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, note)| note)
    }

    pub fn note_mut(&mut self, handle: NoteHandle) -> Option<&mut Note> {
        self.open_notes
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, note)| note)
    }

    /// Open notes in the order they were opened.
    pub fn open_notes(&self) -> impl Iterator<Item = (NoteHandle, &Note)> {
        self.open_notes.iter().map(|(h, note)| (*h, note))
    }

    /// Handle of the open note with stored id `id`, if any.
    #[must_use]
    pub fn handle_of(&self, id: &str) -> Option<NoteHandle> {
        self.open_notes
            .iter()
            .find(|(_, note)| note.id.as_deref() == Some(id))
            .map(|(h, _)| *h)
    }

    /// Opens a blank, unsaved note of `kind`, placed diagonally below the
    /// previously opened ones.
    ///
    /// A blank picture note has an empty `image_path` until an image is chosen.
    pub fn new_note(&mut self, kind: NoteKind) -> NoteHandle {
        let mut note = Note::blank(kind);
        note.color = self.default_color;
        let step = i32::try_from(self.open_notes.len()).unwrap_or(i32::MAX / STAGGER_STEP);
        note.geometry = Geometry::default().offset(step * STAGGER_STEP, step * STAGGER_STEP);
        self.open_note(note)
    }

    /// Opens a blank note of the parent's kind and color, linked to the
    /// parent as a subset note of the same Note File.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NotFound`] if `parent` is not open.
    pub fn spawn_child_of(&mut self, parent: NoteHandle) -> Result<NoteHandle> {
        let parent = &self.open_notes[self.slot(parent)?].1;
        let mut child = Note::blank(parent.kind());
        child.color = parent.color;
        child.parent_id = parent.id.clone();
        child.note_file = parent.note_file.clone();
        child.geometry = parent.geometry.offset(CHILD_OFFSET, CHILD_OFFSET);
        Ok(self.open_note(child))
    }

    /// Opens an unsaved copy of a note, offset from the original.
    ///
    /// The copy has no id and no Note File; it becomes a separate note on its
    /// first save.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NotFound`] if `source` is not open.
    pub fn duplicate(&mut self, source: NoteHandle) -> Result<NoteHandle> {
        let mut copy = self.open_notes[self.slot(source)?].1.clone();
        copy.id = None;
        copy.note_file = None;
        copy.created_at = None;
        copy.modified_at = None;
        copy.geometry = copy.geometry.offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        Ok(self.open_note(copy))
    }

    /// Closes an open note and hands it back; `None` if it was not open.
    pub fn close(&mut self, handle: NoteHandle) -> Option<Note> {
        let index = self.slot(handle).ok()?;
        Some(self.open_notes.remove(index).1)
    }

    /// Saves an open note, binding it to [`current_file`](Self::current_file)
    /// if it has no Note File yet. Returns the note's id.
    ///
    /// The open note is only updated once the store has written it.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NotFound`] if `handle` is not open, or any
    /// error of [`Store::save_note`].
    pub fn save(&mut self, handle: NoteHandle, store: &mut Store) -> Result<String> {
        let index = self.slot(handle)?;
        let mut note = self.open_notes[index].1.clone();
        if note.note_file.is_none() {
            note.note_file.clone_from(&self.current_file);
        }
        let id = store.save_note(&mut note)?;
        self.open_notes[index].1 = note;
        Ok(id)
    }

    /// Saves an open note as a subset (child) of `parent_id`, or of the
    /// selected note when `parent_id` is `None`.
    ///
    /// An unbound note joins the parent's Note File.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NotFound`] if no parent is given or selected,
    /// the parent has no stored document, or `handle` is not open.
    pub fn save_as_subset(
        &mut self,
        handle: NoteHandle,
        parent_id: Option<&str>,
        store: &mut Store,
    ) -> Result<String> {
        let parent_id = parent_id
            .map(str::to_string)
            .or_else(|| self.selected_note.clone())
            .ok_or_else(|| NotebookError::NotFound("no parent note selected".to_string()))?;
        let parent = store.get_note(&parent_id)?;

        let index = self.slot(handle)?;
        let mut note = self.open_notes[index].1.clone();
        if note.id.as_deref() == Some(parent_id.as_str()) {
            log::warn!("Ignoring request to make note {parent_id} its own parent");
        } else {
            note.parent_id = Some(parent_id);
        }
        if note.note_file.is_none() {
            note.note_file = parent.note_file.or_else(|| self.current_file.clone());
        }
        let id = store.save_note(&mut note)?;
        self.open_notes[index].1 = note;
        Ok(id)
    }

    /// Changes the kind of an open note in place and returns the retired
    /// note.
    ///
    /// A saved note is written under its existing id before the open slot is
    /// swapped, so the note is reachable from the store or the open notes at
    /// every point. An unsaved note stays unsaved. On any error the old note
    /// remains open, untouched.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NotFound`] if `handle` is not open,
    /// [`NotebookError::UnsupportedConversion`] for a conversion into a
    /// picture, or any error of [`Store::save_note`].
    pub fn convert(
        &mut self,
        handle: NoteHandle,
        target: NoteKind,
        color: NoteColor,
        store: &mut Store,
    ) -> Result<Note> {
        let index = self.slot(handle)?;
        let mut converted = convert(&self.open_notes[index].1, target, color)?;
        if converted.is_saved() {
            store.save_note(&mut converted)?;
        }
        let retired = std::mem::replace(&mut self.open_notes[index].1, converted);
        log::info!(
            "Converted open note {} from {} to {target}",
            handle.0,
            retired.kind()
        );
        Ok(retired)
    }

    /// Copies freshly edited metadata (color, id tag, description,
    /// instructions) onto every open copy of note `id`. Returns how many open
    /// notes were refreshed.
    pub fn apply_metadata(&mut self, id: &str, updated: &Note) -> usize {
        let mut refreshed = 0;
        for (_, note) in self
            .open_notes
            .iter_mut()
            .filter(|(_, note)| note.id.as_deref() == Some(id))
        {
            note.color = updated.color;
            note.id_tag.clone_from(&updated.id_tag);
            note.description.clone_from(&updated.description);
            note.instructions.clone_from(&updated.instructions);
            refreshed += 1;
        }
        refreshed
    }
}
