//! On-disk notebook: the `notebook.json` index plus one JSON document per note.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::{
    build_hierarchy, HierarchyEntry, Note, NoteColor, NoteFileMetadata, NoteKind, NotebookError,
    NotebookIndex, Result, TagConfig,
};

/// File name of the index inside a notebook directory.
pub const INDEX_FILE_NAME: &str = "notebook.json";

/// A change made through a [`Store`], reported to its listener after the
/// change has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    /// A Note File was created.
    FileAdded { name: String },
    /// A Note File was removed from the index; its notes were left on disk.
    FileRemoved { name: String },
    /// A note document was written.
    NoteSaved {
        note_id: String,
        note_file: Option<String>,
    },
    /// A note was removed from a Note File and its document deleted.
    NoteDeleted { note_file: String, note_id: String },
    /// The id order of a Note File changed.
    Reordered { note_file: String },
    /// File metadata or a note's metadata fields changed.
    MetadataChanged {
        note_file: Option<String>,
        note_id: Option<String>,
    },
}

/// Partial edit of a stored note's metadata; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteMetadataUpdate {
    pub color: Option<NoteColor>,
    /// A blank tag clears the note's id tag.
    pub id_tag: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
}

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// A notebook directory opened for reading and writing.
///
/// All operations are synchronous and write through immediately: every
/// successful mutation leaves `notebook.json` and the note documents in a
/// consistent state on disk before the listener is called.
pub struct Store {
    root: PathBuf,
    index: NotebookIndex,
    listener: Option<Listener>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("root", &self.root)
            .field("index", &self.index)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl Store {
    /// Opens the notebook in `root`, creating the directory if needed.
    ///
    /// A missing `notebook.json` yields an empty notebook; it is written on
    /// the first mutation.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::Io`] if the directory cannot be created or the
    /// index cannot be read, and [`NotebookError::MalformedPersisted`] if the
    /// index is not valid JSON.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let index_path = root.join(INDEX_FILE_NAME);
        let index = match fs::read_to_string(&index_path) {
            Ok(json) => NotebookIndex::from_json(&json).map_err(|e| {
                NotebookError::MalformedPersisted {
                    path: index_path.clone(),
                    reason: e.to_string(),
                }
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => NotebookIndex::default(),
            Err(e) => return Err(e.into()),
        };

        log::info!(
            "Opened notebook {} ({} note files)",
            root.display(),
            index.note_files.len()
        );
        Ok(Self {
            root,
            index,
            listener: None,
        })
    }

    /// Directory holding the index and the note documents.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &NotebookIndex {
        &self.index
    }

    /// Registers the callback that is told about every successful mutation,
    /// replacing any previous one.
    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    fn emit(&mut self, event: StoreEvent) {
        log::debug!("Store event: {event:?}");
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
    }

    fn save_index(&self) -> Result<()> {
        fs::write(self.root.join(INDEX_FILE_NAME), self.index.to_json()?)?;
        Ok(())
    }

    // ── Note Files ──────────────────────────────────────────────────

    /// Note File names in alphabetical order.
    #[must_use]
    pub fn list_files(&self) -> Vec<String> {
        self.index.note_files.keys().cloned().collect()
    }

    #[must_use]
    pub fn contains_file(&self, name: &str) -> bool {
        self.index.note_files.contains_key(name)
    }

    /// Ordered note ids of a Note File.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn note_ids(&self, file: &str) -> Result<&[String]> {
        self.index
            .ids(file)
            .ok_or_else(|| NotebookError::NoteFileNotFound(file.to_string()))
    }

    fn ids_mut(&mut self, file: &str) -> Result<&mut Vec<String>> {
        self.index
            .note_files
            .get_mut(file)
            .ok_or_else(|| NotebookError::NoteFileNotFound(file.to_string()))
    }

    /// Creates an empty Note File and returns its trimmed name.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::InvalidNoteFile`] if the name is blank or
    /// already in use.
    pub fn add_file(&mut self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NotebookError::InvalidNoteFile(
                "name must not be empty".to_string(),
            ));
        }
        if self.contains_file(name) {
            return Err(NotebookError::InvalidNoteFile(format!(
                "'{name}' already exists"
            )));
        }

        let name = name.to_string();
        self.index.note_files.insert(name.clone(), Vec::new());
        self.index
            .note_file_metadata
            .insert(name.clone(), NoteFileMetadata::default());
        self.save_index()?;
        log::info!("Created note file '{name}'");
        self.emit(StoreEvent::FileAdded { name: name.clone() });
        Ok(name)
    }

    /// Removes a Note File from the index. Its notes stay on disk, loadable
    /// by id but no longer listed anywhere.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn remove_file(&mut self, name: &str) -> Result<()> {
        let ids = self
            .index
            .note_files
            .remove(name)
            .ok_or_else(|| NotebookError::NoteFileNotFound(name.to_string()))?;
        self.index.note_file_metadata.remove(name);
        self.save_index()?;
        log::info!("Removed note file '{name}', orphaning {} notes", ids.len());
        self.emit(StoreEvent::FileRemoved {
            name: name.to_string(),
        });
        Ok(())
    }

    // ── Note documents ──────────────────────────────────────────────

    fn document_path(&self, id: &str, kind: NoteKind) -> PathBuf {
        match kind {
            NoteKind::Picture => self.root.join(format!("{id}.json")),
            NoteKind::Text | NoteKind::Code => self.root.join(format!("note_{id}.json")),
        }
    }

    /// Both possible document paths of `id`, text/code pattern first.
    fn candidate_paths(&self, id: &str) -> [PathBuf; 2] {
        [
            self.document_path(id, NoteKind::Text),
            self.document_path(id, NoteKind::Picture),
        ]
    }

    /// Writes `note` to disk, assigning an id on its first save.
    ///
    /// A note bound to a Note File is appended to that file's list unless it
    /// is already there, and taken out of any other file's list. A note with
    /// no Note File leaves the index alone. Saving a note again rewrites the
    /// same document. Returns the note's id.
    ///
    /// `note` only receives its id and timestamps once its document has been
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] if `note.note_file` names a
    /// file that does not exist, [`NotebookError::NotFound`] if the note
    /// carries an id that cannot be used as a file name (nothing is written
    /// in either case), or an I/O or JSON error if writing fails.
    pub fn save_note(&mut self, note: &mut Note) -> Result<String> {
        if let Some(file) = note.note_file.as_deref() {
            if !self.contains_file(file) {
                return Err(NotebookError::NoteFileNotFound(file.to_string()));
            }
        }
        if let Some(id) = note.id.as_deref() {
            if !is_plain_id(id) {
                return Err(NotebookError::NotFound(format!("invalid note id '{id}'")));
            }
        }

        let mut saved = note.clone();
        let id = saved
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let now = Utc::now();
        saved.created_at.get_or_insert(now);
        saved.modified_at = Some(now);

        let path = self.document_path(&id, saved.kind());
        fs::write(&path, serde_json::to_string_pretty(&saved)?)?;
        *note = saved;
        for stale in self.candidate_paths(&id) {
            if stale != path {
                remove_if_exists(&stale)?;
            }
        }

        let mut index_changed = false;
        if let Some(file) = note.note_file.as_deref() {
            for (name, ids) in self.index.note_files.iter_mut() {
                if name == file {
                    if !ids.contains(&id) {
                        ids.push(id.clone());
                        index_changed = true;
                    }
                } else if let Some(pos) = ids.iter().position(|i| *i == id) {
                    ids.remove(pos);
                    index_changed = true;
                }
            }
        }
        if index_changed {
            self.save_index()?;
        }

        log::debug!("Saved {} note {id} to {}", note.kind(), path.display());
        self.emit(StoreEvent::NoteSaved {
            note_id: id.clone(),
            note_file: note.note_file.clone(),
        });
        Ok(id)
    }

    /// Loads a note by id, probing both document name patterns.
    ///
    /// Returns `Ok(None)` when no document exists for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::MalformedPersisted`] if the document exists
    /// but cannot be parsed, or [`NotebookError::Io`] if it cannot be read.
    pub fn load_note(&self, id: &str) -> Result<Option<Note>> {
        if !is_plain_id(id) {
            log::warn!("Refusing to load note with unsafe id '{id}'");
            return Ok(None);
        }
        for path in self.candidate_paths(id) {
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let mut note: Note =
                serde_json::from_str(&json).map_err(|e| NotebookError::MalformedPersisted {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            // Older documents may lack the id or carry a stale one.
            note.id = Some(id.to_string());
            // Older picture documents are only bound through the index.
            if note.note_file.is_none() {
                note.note_file = self.index.file_of(id).map(str::to_string);
            }
            return Ok(Some(note));
        }
        Ok(None)
    }

    /// Like [`load_note`](Self::load_note), but a missing note is an error.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NotFound`] when no document exists for `id`.
    pub fn get_note(&self, id: &str) -> Result<Note> {
        self.load_note(id)?
            .ok_or_else(|| NotebookError::NotFound(id.to_string()))
    }

    /// Removes `id` from a Note File and deletes its document.
    ///
    /// Children keep their now dangling `parent_id` and show up at top level.
    /// Returns whether the id was listed in the file.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn delete_note(&mut self, file: &str, id: &str) -> Result<bool> {
        let ids = self.ids_mut(file)?;
        let listed = match ids.iter().position(|i| i == id) {
            Some(pos) => {
                ids.remove(pos);
                true
            }
            None => false,
        };
        if listed {
            self.save_index()?;
        }
        if is_plain_id(id) {
            for path in self.candidate_paths(id) {
                remove_if_exists(&path)?;
            }
        }

        log::info!("Deleted note {id} from '{file}'");
        self.emit(StoreEvent::NoteDeleted {
            note_file: file.to_string(),
            note_id: id.to_string(),
        });
        Ok(listed)
    }

    // ── Ordering ────────────────────────────────────────────────────

    /// Swaps `id` with the entry before it. Returns `false` (and changes
    /// nothing) when `id` is first or not listed.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn move_up(&mut self, file: &str, id: &str) -> Result<bool> {
        let ids = self.ids_mut(file)?;
        match ids.iter().position(|i| i == id) {
            Some(pos) if pos > 0 => {
                ids.swap(pos, pos - 1);
                self.finish_reorder(file)
            }
            _ => Ok(false),
        }
    }

    /// Swaps `id` with the entry after it. Returns `false` (and changes
    /// nothing) when `id` is last or not listed.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn move_down(&mut self, file: &str, id: &str) -> Result<bool> {
        let ids = self.ids_mut(file)?;
        match ids.iter().position(|i| i == id) {
            Some(pos) if pos + 1 < ids.len() => {
                ids.swap(pos, pos + 1);
                self.finish_reorder(file)
            }
            _ => Ok(false),
        }
    }

    /// Moves `dragged` to just before `target`.
    ///
    /// A no-op returning `false` if the ids are equal or either one is not
    /// listed in the file.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn reorder(&mut self, file: &str, dragged: &str, target: &str) -> Result<bool> {
        if dragged == target {
            return Ok(false);
        }
        let ids = self.ids_mut(file)?;
        let (Some(from), true) = (
            ids.iter().position(|i| i == dragged),
            ids.iter().any(|i| i == target),
        ) else {
            return Ok(false);
        };

        let moved = ids.remove(from);
        let to = ids.iter().position(|i| i == target).unwrap_or(ids.len());
        ids.insert(to, moved);
        self.finish_reorder(file)
    }

    fn finish_reorder(&mut self, file: &str) -> Result<bool> {
        self.save_index()?;
        self.emit(StoreEvent::Reordered {
            note_file: file.to_string(),
        });
        Ok(true)
    }

    // ── Listing ─────────────────────────────────────────────────────

    /// Loads every note listed in `file`, in list order.
    ///
    /// Missing and malformed documents are skipped with a warning so that one
    /// bad note does not hide the rest of the file.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn notes_in_file(&self, file: &str) -> Result<Vec<Note>> {
        let mut notes = Vec::new();
        for id in self.note_ids(file)? {
            match self.load_note(id) {
                Ok(Some(note)) => notes.push(note),
                Ok(None) => log::warn!("Note {id} listed in '{file}' has no document; skipping"),
                Err(e) => log::warn!("Skipping note {id} in '{file}': {e}"),
            }
        }
        Ok(notes)
    }

    /// Depth-annotated display order of `file`.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn hierarchy(&self, file: &str) -> Result<Vec<HierarchyEntry>> {
        let parents: HashMap<String, Option<String>> = self
            .notes_in_file(file)?
            .into_iter()
            .filter_map(|note| note.id.map(|id| (id, note.parent_id)))
            .collect();
        Ok(build_hierarchy(self.note_ids(file)?, &parents))
    }

    // ── Metadata ────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn file_metadata(&self, file: &str) -> Result<&NoteFileMetadata> {
        if !self.contains_file(file) {
            return Err(NotebookError::NoteFileNotFound(file.to_string()));
        }
        self.index
            .note_file_metadata
            .get(file)
            .ok_or_else(|| NotebookError::NoteFileNotFound(file.to_string()))
    }

    /// Replaces the metadata of `file`.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn set_file_metadata(&mut self, file: &str, metadata: NoteFileMetadata) -> Result<()> {
        if !self.contains_file(file) {
            return Err(NotebookError::NoteFileNotFound(file.to_string()));
        }
        self.index
            .note_file_metadata
            .insert(file.to_string(), metadata);
        self.save_index()?;
        self.emit(StoreEvent::MetadataChanged {
            note_file: Some(file.to_string()),
            note_id: None,
        });
        Ok(())
    }

    /// Id tags used by the notes of `file`, numbers first in numeric order,
    /// then the rest alphabetically.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn used_id_tags(&self, file: &str) -> Result<Vec<String>> {
        let mut tags: Vec<String> = self
            .notes_in_file(file)?
            .into_iter()
            .filter_map(|note| note.id_tag)
            .collect();
        tags.sort_by(|a, b| compare_tags(a, b));
        tags.dedup();
        Ok(tags)
    }

    /// Fills in the per-id-tag config of `file` from its notes.
    ///
    /// For every tag with no config, or an empty one, the description and
    /// instructions of the first note (in file order) carrying that tag are
    /// copied in. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NoteFileNotFound`] for an unknown file.
    pub fn sync_tag_config(&mut self, file: &str) -> Result<bool> {
        let notes = self.notes_in_file(file)?;
        let metadata = self
            .index
            .note_file_metadata
            .entry(file.to_string())
            .or_default();

        let mut changed = false;
        for note in notes {
            let Some(tag) = note.id_tag else { continue };
            if metadata
                .number_config
                .get(&tag)
                .is_some_and(|config| !config.is_empty())
            {
                continue;
            }
            let config = TagConfig {
                description: note.description,
                instructions: note.instructions,
            };
            if !config.is_empty() {
                metadata.number_config.insert(tag, config);
                changed = true;
            }
        }

        if changed {
            self.save_index()?;
            self.emit(StoreEvent::MetadataChanged {
                note_file: Some(file.to_string()),
                note_id: None,
            });
        }
        Ok(changed)
    }

    /// Edits color, id tag, description and instructions of a stored note.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::NotFound`] if `id` has no document, or the
    /// errors of [`save_note`](Self::save_note).
    pub fn update_note_metadata(&mut self, id: &str, update: NoteMetadataUpdate) -> Result<Note> {
        let mut note = self.get_note(id)?;
        if let Some(color) = update.color {
            note.color = color;
        }
        if let Some(tag) = update.id_tag.as_deref() {
            note.set_id_tag(tag);
        }
        if let Some(description) = update.description {
            note.description = description;
        }
        if let Some(instructions) = update.instructions {
            note.instructions = instructions;
        }
        // A note whose file was removed is saved unbound rather than failing.
        if let Some(file) = note.note_file.as_deref() {
            if !self.contains_file(file) {
                note.note_file = None;
            }
        }

        self.save_note(&mut note)?;
        self.emit(StoreEvent::MetadataChanged {
            note_file: note.note_file.clone(),
            note_id: Some(id.to_string()),
        });
        Ok(note)
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Ids become file names; anything that could leave the notebook directory
/// is never looked up.
fn is_plain_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\']) && id != "." && id != ".."
}

fn compare_tags(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (dir, store)
    }

    fn saved_in(store: &mut Store, file: &str, body: &str) -> String {
        let mut note = Note::new_text(body);
        note.note_file = Some(file.to_string());
        store.save_note(&mut note).unwrap()
    }

    fn read_index(dir: &TempDir) -> serde_json::Value {
        let json = fs::read_to_string(dir.path().join(INDEX_FILE_NAME)).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_add_file_trims_and_rejects_duplicates() {
        let (_dir, mut store) = store();
        assert_eq!(store.add_file("  Work ").unwrap(), "Work");
        assert!(matches!(
            store.add_file("Work"),
            Err(NotebookError::InvalidNoteFile(_))
        ));
        assert!(matches!(
            store.add_file("   "),
            Err(NotebookError::InvalidNoteFile(_))
        ));
        assert_eq!(store.list_files(), vec!["Work".to_string()]);
    }

    #[test]
    fn test_list_files_is_sorted() {
        let (_dir, mut store) = store();
        store.add_file("zeta").unwrap();
        store.add_file("Alpha").unwrap();
        store.add_file("beta").unwrap();
        assert_eq!(store.list_files(), vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_save_assigns_id_and_indexes() {
        let (dir, mut store) = store();
        store.add_file("Work").unwrap();
        let mut note = Note::new_text("hello");
        note.note_file = Some("Work".to_string());

        let id = store.save_note(&mut note).unwrap();
        assert_eq!(note.id.as_deref(), Some(id.as_str()));
        assert!(note.created_at.is_some());
        assert!(dir.path().join(format!("note_{id}.json")).exists());
        assert_eq!(read_index(&dir)["note_files"]["Work"], serde_json::json!([id]));
    }

    #[test]
    fn test_save_twice_does_not_duplicate() {
        let (_dir, mut store) = store();
        store.add_file("Work").unwrap();
        let mut note = Note::new_text("v1");
        note.note_file = Some("Work".to_string());
        let id = store.save_note(&mut note).unwrap();
        note.set_body("v2");
        let again = store.save_note(&mut note).unwrap();

        assert_eq!(id, again);
        assert_eq!(store.note_ids("Work").unwrap(), [id.clone()]);
        assert_eq!(store.get_note(&id).unwrap().body(), Some("v2"));
    }

    #[test]
    fn test_save_into_unknown_file_writes_nothing() {
        let (dir, mut store) = store();
        let mut note = Note::new_text("x");
        note.note_file = Some("Nope".to_string());
        assert!(matches!(
            store.save_note(&mut note),
            Err(NotebookError::NoteFileNotFound(_))
        ));
        assert!(note.id.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unbound_note_is_saved_but_not_indexed() {
        let (_dir, mut store) = store();
        store.add_file("Work").unwrap();
        let id = store.save_note(&mut Note::new_text("loose")).unwrap();
        assert!(store.note_ids("Work").unwrap().is_empty());
        assert!(store.load_note(&id).unwrap().is_some());
    }

    #[test]
    fn test_index_only_picture_stays_in_its_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(INDEX_FILE_NAME),
            r#"{"note_files": {"Pics": ["p1"]}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("p1.json"),
            r#"{"id": "p1", "type": "picture", "title": "shot", "image_path": "/img/shot.png", "text_boxes": []}"#,
        )
        .unwrap();
        let mut store = Store::open(dir.path()).unwrap();

        let loaded = store.get_note("p1").unwrap();
        assert_eq!(loaded.note_file.as_deref(), Some("Pics"));

        let updated = store
            .update_note_metadata(
                "p1",
                NoteMetadataUpdate {
                    color: Some(NoteColor::Blue),
                    ..NoteMetadataUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.color, NoteColor::Blue);
        assert_eq!(store.note_ids("Pics").unwrap(), ["p1"]);

        let reopened = Store::open(dir.path()).unwrap();
        assert_eq!(reopened.note_ids("Pics").unwrap(), ["p1"]);
        assert_eq!(reopened.get_note("p1").unwrap().color, NoteColor::Blue);
    }

    #[test]
    fn test_unbound_resave_keeps_existing_listing() {
        let (_dir, mut store) = store();
        store.add_file("Work").unwrap();
        let id = saved_in(&mut store, "Work", "x");
        let mut note = store.get_note(&id).unwrap();
        note.note_file = None;
        store.save_note(&mut note).unwrap();
        assert_eq!(store.note_ids("Work").unwrap(), [id]);
    }

    #[test]
    fn test_save_rejects_unsafe_id() {
        let (dir, mut store) = store();
        let mut note = Note::new_text("x");
        note.id = Some("../escape".to_string());
        assert!(matches!(
            store.save_note(&mut note),
            Err(NotebookError::NotFound(_))
        ));
        assert!(note.created_at.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_write_leaves_note_unsaved() {
        let (dir, mut store) = store();
        fs::remove_dir_all(dir.path()).unwrap();

        let mut note = Note::new_text("x");
        assert!(store.save_note(&mut note).is_err());
        assert!(!note.is_saved());
        assert!(note.created_at.is_none());
        assert!(note.modified_at.is_none());
    }

    #[test]
    fn test_moving_note_between_files_keeps_one_entry() {
        let (_dir, mut store) = store();
        store.add_file("A").unwrap();
        store.add_file("B").unwrap();
        let mut note = Note::new_text("x");
        note.note_file = Some("A".to_string());
        let id = store.save_note(&mut note).unwrap();
        note.note_file = Some("B".to_string());
        store.save_note(&mut note).unwrap();

        assert!(store.note_ids("A").unwrap().is_empty());
        assert_eq!(store.note_ids("B").unwrap(), [id]);
    }

    #[test]
    fn test_picture_uses_bare_file_name_and_load_probes_both() {
        let (dir, mut store) = store();
        store.add_file("Pics").unwrap();
        let mut picture = Note::new_picture("/img/a.png");
        picture.note_file = Some("Pics".to_string());
        let id = store.save_note(&mut picture).unwrap();

        assert!(dir.path().join(format!("{id}.json")).exists());
        assert!(!dir.path().join(format!("note_{id}.json")).exists());
        assert_eq!(store.get_note(&id).unwrap(), picture);
    }

    #[test]
    fn test_kind_change_removes_stale_document() {
        let (dir, mut store) = store();
        let mut picture = Note::new_picture("/img/a.png");
        let id = store.save_note(&mut picture).unwrap();
        let mut text = crate::convert(&picture, NoteKind::Text, NoteColor::Green).unwrap();
        store.save_note(&mut text).unwrap();

        assert!(!dir.path().join(format!("{id}.json")).exists());
        assert_eq!(store.get_note(&id).unwrap().kind(), NoteKind::Text);
    }

    #[test]
    fn test_unknown_id_loads_as_none() {
        let (_dir, store) = store();
        assert!(store.load_note("missing").unwrap().is_none());
        assert!(store.load_note("../etc/passwd").unwrap().is_none());
        assert!(matches!(
            store.get_note("missing"),
            Err(NotebookError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_document_is_reported_and_skipped_in_listing() {
        let (dir, mut store) = store();
        store.add_file("Work").unwrap();
        let good = saved_in(&mut store, "Work", "good");
        let bad = saved_in(&mut store, "Work", "bad");
        fs::write(dir.path().join(format!("note_{bad}.json")), "{ not json").unwrap();

        assert!(matches!(
            store.load_note(&bad),
            Err(NotebookError::MalformedPersisted { .. })
        ));
        let notes = store.notes_in_file("Work").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id.as_deref(), Some(good.as_str()));
    }

    #[test]
    fn test_remove_file_orphans_notes() {
        let (_dir, mut store) = store();
        store.add_file("Work").unwrap();
        let id = saved_in(&mut store, "Work", "x");
        store.remove_file("Work").unwrap();

        assert!(!store.contains_file("Work"));
        assert!(store.load_note(&id).unwrap().is_some());
        assert!(matches!(
            store.remove_file("Work"),
            Err(NotebookError::NoteFileNotFound(_))
        ));
    }

    #[test]
    fn test_delete_note_does_not_cascade() {
        let (_dir, mut store) = store();
        store.add_file("Work").unwrap();
        let parent = saved_in(&mut store, "Work", "parent");
        let mut child = Note::new_text("child");
        child.note_file = Some("Work".to_string());
        child.parent_id = Some(parent.clone());
        let child_id = store.save_note(&mut child).unwrap();

        assert!(store.delete_note("Work", &parent).unwrap());
        assert!(store.load_note(&parent).unwrap().is_none());
        assert_eq!(store.note_ids("Work").unwrap(), [child_id.clone()]);

        let rows = store.hierarchy("Work").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].note_id, child_id);
        assert_eq!(rows[0].depth, 0);
    }

    #[test]
    fn test_move_up_and_down_respect_boundaries() {
        let (_dir, mut store) = store();
        store.add_file("W").unwrap();
        let a = saved_in(&mut store, "W", "a");
        let b = saved_in(&mut store, "W", "b");
        let c = saved_in(&mut store, "W", "c");

        assert!(!store.move_up("W", &a).unwrap());
        assert!(!store.move_down("W", &c).unwrap());
        assert_eq!(store.note_ids("W").unwrap(), [a.clone(), b.clone(), c.clone()]);

        assert!(store.move_up("W", &c).unwrap());
        assert_eq!(store.note_ids("W").unwrap(), [a.clone(), c.clone(), b.clone()]);
        assert!(store.move_down("W", &a).unwrap());
        assert_eq!(store.note_ids("W").unwrap(), [c, a, b]);
    }

    #[test]
    fn test_reorder_inserts_before_target() {
        let (_dir, mut store) = store();
        store.add_file("W").unwrap();
        let ids: Vec<String> = ["a", "b", "c", "d"]
            .iter()
            .map(|body| saved_in(&mut store, "W", body))
            .collect();

        assert!(store.reorder("W", &ids[3], &ids[1]).unwrap());
        assert_eq!(
            store.note_ids("W").unwrap(),
            [ids[0].clone(), ids[3].clone(), ids[1].clone(), ids[2].clone()]
        );

        assert!(store.reorder("W", &ids[0], &ids[2]).unwrap());
        assert_eq!(
            store.note_ids("W").unwrap(),
            [ids[3].clone(), ids[1].clone(), ids[0].clone(), ids[2].clone()]
        );

        let before = store.note_ids("W").unwrap().to_vec();
        assert!(!store.reorder("W", &ids[0], &ids[0]).unwrap());
        assert!(!store.reorder("W", &ids[0], "ghost").unwrap());
        assert!(!store.reorder("W", "ghost", &ids[0]).unwrap());
        assert_eq!(store.note_ids("W").unwrap(), before);
    }

    #[test]
    fn test_order_survives_reopen() {
        let (dir, mut store) = store();
        store.add_file("W").unwrap();
        let a = saved_in(&mut store, "W", "a");
        let b = saved_in(&mut store, "W", "b");
        store.move_down("W", &a).unwrap();

        let reopened = Store::open(dir.path()).unwrap();
        assert_eq!(reopened.note_ids("W").unwrap(), [b, a]);
    }

    #[test]
    fn test_opens_nested_legacy_index() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(INDEX_FILE_NAME),
            r#"{"note_files": {"Old": {"notes": ["n1"], "description": "legacy"}}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("note_n1.json"),
            r#"{"id": "n1", "text": "hi", "note_file": "Old"}"#,
        )
        .unwrap();

        let mut store = Store::open(dir.path()).unwrap();
        assert_eq!(store.file_metadata("Old").unwrap().description, "legacy");
        assert_eq!(store.notes_in_file("Old").unwrap()[0].body(), Some("hi"));

        store.add_file("New").unwrap();
        let index = read_index(&dir);
        assert_eq!(index["note_files"]["Old"], serde_json::json!(["n1"]));
        assert_eq!(index["note_file_metadata"]["Old"]["description"], "legacy");
    }

    #[test]
    fn test_corrupt_index_is_malformed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(INDEX_FILE_NAME), "[1, 2").unwrap();
        assert!(matches!(
            Store::open(dir.path()),
            Err(NotebookError::MalformedPersisted { .. })
        ));
    }

    #[test]
    fn test_listener_sees_mutations() {
        let (_dir, mut store) = store();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        store.set_listener(move |event| sink.borrow_mut().push(event.clone()));

        store.add_file("W").unwrap();
        let id = saved_in(&mut store, "W", "x");
        store.delete_note("W", &id).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], StoreEvent::FileAdded { name: "W".to_string() });
        assert_eq!(
            events[1],
            StoreEvent::NoteSaved {
                note_id: id.clone(),
                note_file: Some("W".to_string())
            }
        );
        assert!(matches!(events[2], StoreEvent::NoteDeleted { .. }));
    }

    #[test]
    fn test_update_note_metadata() {
        let (_dir, mut store) = store();
        store.add_file("W").unwrap();
        let id = saved_in(&mut store, "W", "x");
        let updated = store
            .update_note_metadata(
                &id,
                NoteMetadataUpdate {
                    color: Some(NoteColor::Purple),
                    id_tag: Some(" A1 ".to_string()),
                    description: Some("why".to_string()),
                    ..NoteMetadataUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.color, NoteColor::Purple);
        let stored = store.get_note(&id).unwrap();
        assert_eq!(stored.id_tag.as_deref(), Some("A1"));
        assert_eq!(stored.description, "why");
        assert_eq!(stored.body(), Some("x"));
        assert_eq!(store.note_ids("W").unwrap().len(), 1);
    }

    #[test]
    fn test_used_id_tags_sort_numbers_first() {
        let (_dir, mut store) = store();
        store.add_file("W").unwrap();
        for tag in ["b", "10", "A", "2", "10"] {
            let mut note = Note::new_text("");
            note.note_file = Some("W".to_string());
            note.set_id_tag(tag);
            store.save_note(&mut note).unwrap();
        }
        assert_eq!(store.used_id_tags("W").unwrap(), vec!["2", "10", "A", "b"]);
    }

    #[test]
    fn test_sync_tag_config_uses_first_tagged_note() {
        let (_dir, mut store) = store();
        store.add_file("W").unwrap();
        for (tag, description) in [("1", "first"), ("1", "second"), ("2", "")] {
            let mut note = Note::new_text("");
            note.note_file = Some("W".to_string());
            note.set_id_tag(tag);
            note.description = description.to_string();
            store.save_note(&mut note).unwrap();
        }

        let mut metadata = store.file_metadata("W").unwrap().clone();
        metadata.number_config.insert(
            "2".to_string(),
            TagConfig {
                description: "kept".to_string(),
                instructions: String::new(),
            },
        );
        store.set_file_metadata("W", metadata).unwrap();

        assert!(store.sync_tag_config("W").unwrap());
        let config = &store.file_metadata("W").unwrap().number_config;
        assert_eq!(config["1"].description, "first");
        assert_eq!(config["2"].description, "kept");
        assert!(!store.sync_tag_config("W").unwrap());
    }
}
