use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use notemark::{RenderMode, StyledText};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::note::{Folder, FolderId, Note, NoteId};
use crate::storage::{write_file, DataPath, DataPathType, Directory};
use crate::{Error, Result};

const LIBRARY_FILE: &str = "library.json";
const LIBRARY_VERSION: u32 = 1;

/// Which notes a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteFilter {
    /// Every note outside the trash
    All,
    Favorites,
    Folder(FolderId),
    /// Notes without a folder
    Unfiled,
    Trash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// On-disk shape of the library.
#[derive(Serialize, Deserialize)]
struct LibraryFile {
    version: u32,
    notes: Vec<Note>,
    folders: Vec<Folder>,
}

/// All notes and folders of one user, persisted as a single JSON document.
#[derive(Debug, Default)]
pub struct NoteStore {
    directory: Option<Directory>,
    notes: IndexMap<NoteId, Note>,
    folders: IndexMap<FolderId, Folder>,
    dirty: bool,
}

impl NoteStore {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the library under `path`. A missing library file is an empty store.
    pub fn load(path: &DataPath) -> Result<Self> {
        let directory = Directory::new(path.path(DataPathType::Notes));
        let mut store = Self::default();

        if directory.has_file(LIBRARY_FILE) {
            let contents = directory.get_file(LIBRARY_FILE)?;
            let file: LibraryFile = serde_json::from_str(&contents)?;
            store.notes = file.notes.into_iter().map(|n| (n.id, n)).collect();
            store.folders = file.folders.into_iter().map(|f| (f.id, f)).collect();
            info!(
                "loaded {} notes and {} folders from {:?}",
                store.notes.len(),
                store.folders.len(),
                directory.file_path
            );
        } else {
            info!("no library at {:?}, starting empty", directory.file_path);
        }

        store.directory = Some(directory);
        Ok(store)
    }

    /// Write the library if anything changed since the last save.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(directory) = &self.directory {
            let file = LibraryFile {
                version: LIBRARY_VERSION,
                notes: self.notes.values().cloned().collect(),
                folders: self.folders.values().cloned().collect(),
            };
            let json = serde_json::to_string_pretty(&file)?;
            write_file(&directory.file_path, LIBRARY_FILE, &json)?;
            info!("saved {} notes", self.notes.len());
        }

        self.dirty = false;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn note(&self, id: NoteId) -> Result<&Note> {
        self.notes.get(&id).ok_or(Error::NoteNotFound(id))
    }

    fn note_mut(&mut self, id: NoteId) -> Result<&mut Note> {
        self.notes.get_mut(&id).ok_or(Error::NoteNotFound(id))
    }

    pub fn folder(&self, id: FolderId) -> Result<&Folder> {
        self.folders.get(&id).ok_or(Error::FolderNotFound(id))
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    /// Folders sorted by name.
    pub fn folders(&self) -> Vec<&Folder> {
        let mut folders: Vec<&Folder> = self.folders.values().collect();
        folders.sort_by_key(|f| f.name.to_lowercase());
        folders
    }

    pub fn folder_by_name(&self, name: &str) -> Option<&Folder> {
        let name = name.trim().to_lowercase();
        self.folders
            .values()
            .find(|f| f.name.to_lowercase() == name)
    }

    pub fn create_note(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        folder: Option<FolderId>,
    ) -> Result<NoteId> {
        if let Some(folder) = folder {
            self.folder(folder)?;
        }

        let mut note = Note::new(title, content, Utc::now());
        note.folder = folder;
        let id = note.id;
        debug!("created note {id}");

        self.notes.insert(id, note);
        self.dirty = true;
        Ok(id)
    }

    pub fn update_note(
        &mut self,
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<()> {
        let note = self.note_mut(id)?;
        note.title = title.into();
        note.content = content.into();
        note.updated_at = Utc::now();
        self.dirty = true;
        Ok(())
    }

    pub fn set_favorite(&mut self, id: NoteId, favorite: bool) -> Result<()> {
        let note = self.note_mut(id)?;
        if note.favorite != favorite {
            note.favorite = favorite;
            note.updated_at = Utc::now();
            self.dirty = true;
        }
        Ok(())
    }

    pub fn move_to_folder(&mut self, id: NoteId, folder: Option<FolderId>) -> Result<()> {
        if let Some(folder) = folder {
            self.folder(folder)?;
        }

        let note = self.note_mut(id)?;
        if note.folder != folder {
            note.folder = folder;
            note.updated_at = Utc::now();
            self.dirty = true;
        }
        Ok(())
    }

    /// Move a note to the trash. Trashing twice keeps the first timestamp.
    pub fn trash(&mut self, id: NoteId) -> Result<()> {
        let now = Utc::now();
        let note = self.note_mut(id)?;
        if note.trashed_at.is_none() {
            note.trashed_at = Some(now);
            note.updated_at = now;
            self.dirty = true;
            debug!("trashed note {id}");
        }
        Ok(())
    }

    pub fn restore(&mut self, id: NoteId) -> Result<()> {
        let note = self.note_mut(id)?;
        if note.trashed_at.take().is_some() {
            note.updated_at = Utc::now();
            self.dirty = true;
            debug!("restored note {id}");
        }
        Ok(())
    }

    /// Permanently remove a trashed note.
    pub fn delete_forever(&mut self, id: NoteId) -> Result<Note> {
        if !self.note(id)?.is_trashed() {
            return Err(Error::NotInTrash(id));
        }

        self.dirty = true;
        self.notes
            .shift_remove(&id)
            .ok_or(Error::NoteNotFound(id))
    }

    /// Permanently remove every trashed note. Returns how many went.
    pub fn empty_trash(&mut self) -> usize {
        let before = self.notes.len();
        self.notes.retain(|_, n| !n.is_trashed());
        let removed = before - self.notes.len();
        if removed > 0 {
            self.dirty = true;
            info!("emptied trash, {removed} notes removed");
        }
        removed
    }

    /// Permanently remove notes trashed more than `retention` before `now`.
    pub fn purge_expired(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let before = self.notes.len();
        self.notes.retain(|_, n| match n.trashed_at {
            Some(at) => now - at <= retention,
            None => true,
        });
        let removed = before - self.notes.len();
        if removed > 0 {
            self.dirty = true;
            info!("purged {removed} expired notes from trash");
        }
        removed
    }

    fn validate_folder_name(&self, name: &str, except: Option<FolderId>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::empty_folder_name());
        }

        match self.folder_by_name(name) {
            Some(existing) if Some(existing.id) != except => Err(Error::duplicate_folder(name)),
            _ => Ok(name.to_string()),
        }
    }

    pub fn create_folder(&mut self, name: &str) -> Result<FolderId> {
        let name = self.validate_folder_name(name, None)?;
        let folder = Folder::new(name, Utc::now());
        let id = folder.id;
        debug!("created folder '{}' {id}", folder.name);

        self.folders.insert(id, folder);
        self.dirty = true;
        Ok(id)
    }

    pub fn rename_folder(&mut self, id: FolderId, name: &str) -> Result<()> {
        self.folder(id)?;
        let name = self.validate_folder_name(name, Some(id))?;

        if let Some(folder) = self.folders.get_mut(&id) {
            folder.name = name;
            folder.updated_at = Utc::now();
            self.dirty = true;
        }
        Ok(())
    }

    /// Delete a folder. Its notes stay, without a folder.
    pub fn delete_folder(&mut self, id: FolderId) -> Result<Folder> {
        let folder = self
            .folders
            .shift_remove(&id)
            .ok_or(Error::FolderNotFound(id))?;

        let now = Utc::now();
        for note in self.notes.values_mut().filter(|n| n.folder == Some(id)) {
            note.folder = None;
            note.updated_at = now;
        }

        self.dirty = true;
        debug!("deleted folder '{}'", folder.name);
        Ok(folder)
    }

    pub fn list(&self, filter: NoteFilter, order: SortOrder) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self
            .notes
            .values()
            .filter(|n| match filter {
                NoteFilter::Trash => n.is_trashed(),
                _ if n.is_trashed() => false,
                NoteFilter::All => true,
                NoteFilter::Favorites => n.favorite,
                NoteFilter::Folder(id) => n.folder == Some(id),
                NoteFilter::Unfiled => n.folder.is_none(),
            })
            .collect();

        match order {
            SortOrder::NewestFirst => notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            SortOrder::OldestFirst => notes.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
        }
        notes
    }

    /// Case-insensitive search over titles and markup-free content, trash excluded.
    pub fn search(&self, query: &str) -> Vec<&Note> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.list(NoteFilter::All, SortOrder::NewestFirst)
            .into_iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&query)
                    || notemark::strip(&n.content).to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Compact styled preview of a note for list rows.
    pub fn preview(&self, id: NoteId, max_chars: usize) -> Result<StyledText> {
        let note = self.note(id)?;
        let mut preview = notemark::render(note.content.trim_end(), RenderMode::Preview);
        preview.truncate_chars(max_chars);
        Ok(preview)
    }

    /// Insert or replace a note wholesale, used when merging a backup.
    pub(crate) fn put_note(&mut self, note: Note) {
        self.notes.insert(note.id, note);
        self.dirty = true;
    }

    pub(crate) fn put_folder(&mut self, folder: Folder) {
        self.folders.insert(folder.id, folder);
        self.dirty = true;
    }

    pub(crate) fn find_note(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(&id)
    }

    pub(crate) fn find_folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.get(&id)
    }
}
