//! Cloud backup and restore through a narrow key-value remote.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::note::{Folder, FolderId, Note};
use crate::session::Session;
use crate::storage::{write_file, DataPath, DataPathType, Directory};
use crate::store::NoteStore;
use crate::{Error, Result};

/// A remote document store: JSON documents addressed by collection and id.
pub trait BackupRemote {
    fn put(&mut self, collection: &str, id: &str, json: &str) -> Result<()>;
    fn get(&self, collection: &str, id: &str) -> Result<Option<String>>;
    fn ids(&self, collection: &str) -> Result<Vec<String>>;
}

/// File-backed remote, one JSON file per document.
pub struct DirectoryRemote {
    base: PathBuf,
}

impl DirectoryRemote {
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    pub fn from_data_path(path: &DataPath) -> Self {
        Self::new(path.path(DataPathType::Backup))
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf> {
        let mut dir = self.base.clone();
        for segment in collection.split('/') {
            check_segment(segment)?;
            dir.push(segment);
        }
        Ok(dir)
    }
}

fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
        return Err(Error::Generic(format!("invalid backup path segment '{segment}'")));
    }
    Ok(())
}

impl BackupRemote for DirectoryRemote {
    fn put(&mut self, collection: &str, id: &str, json: &str) -> Result<()> {
        check_segment(id)?;
        let dir = self.collection_dir(collection)?;
        write_file(&dir, &format!("{id}.json"), json)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<String>> {
        check_segment(id)?;
        let dir = Directory::new(self.collection_dir(collection)?);
        let file_name = format!("{id}.json");
        if !dir.has_file(&file_name) {
            return Ok(None);
        }
        dir.get_file(&file_name).map(Some)
    }

    fn ids(&self, collection: &str) -> Result<Vec<String>> {
        let dir = Directory::new(self.collection_dir(collection)?);
        Ok(dir
            .get_file_names()?
            .into_iter()
            .filter_map(|name| name.strip_suffix(".json").map(str::to_owned))
            .collect())
    }
}

/// In-process remote, handy for tests and offline sessions.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    collections: HashMap<String, BTreeMap<String, String>>,
}

impl BackupRemote for MemoryRemote {
    fn put(&mut self, collection: &str, id: &str, json: &str) -> Result<()> {
        self.collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), json.to_owned());
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<String>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    fn ids(&self, collection: &str) -> Result<Vec<String>> {
        Ok(self
            .collections
            .get(collection)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackupReport {
    pub notes: usize,
    pub folders: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    pub added: usize,
    pub updated: usize,
    /// Entries where the local copy was as new or newer, or unreadable
    pub skipped: usize,
}

fn notes_collection(user_id: &str) -> String {
    format!("users/{user_id}/notes")
}

fn folders_collection(user_id: &str) -> String {
    format!("users/{user_id}/folders")
}

fn account(session: &Session) -> Result<&str> {
    session.user_id().ok_or(Error::GuestSession)
}

/// Upload every folder and note, trashed ones included.
pub fn backup(
    store: &NoteStore,
    remote: &mut impl BackupRemote,
    session: &Session,
) -> Result<BackupReport> {
    let user_id = account(session)?;
    let mut report = BackupReport::default();

    let folders = folders_collection(user_id);
    for folder in store.folders() {
        remote.put(&folders, &folder.id.to_string(), &serde_json::to_string(folder)?)?;
        report.folders += 1;
    }

    let notes = notes_collection(user_id);
    for note in store.notes() {
        remote.put(&notes, &note.id.to_string(), &serde_json::to_string(note)?)?;
        report.notes += 1;
    }

    info!(
        "backed up {} notes and {} folders for {user_id}",
        report.notes, report.folders
    );
    Ok(report)
}

fn fetch<T: DeserializeOwned>(
    remote: &impl BackupRemote,
    collection: &str,
    id: &str,
) -> Option<T> {
    match remote.get(collection, id) {
        Ok(Some(json)) => match serde_json::from_str(&json) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!("skipping unreadable backup entry {collection}/{id}: {err}");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            warn!("could not fetch backup entry {collection}/{id}: {err}");
            None
        }
    }
}

/// Merge the remote copy into the local store. Last write wins by `updated_at`.
pub fn restore(
    store: &mut NoteStore,
    remote: &impl BackupRemote,
    session: &Session,
) -> Result<RestoreReport> {
    let user_id = account(session)?;
    let mut report = RestoreReport::default();

    // backup folder id -> local folder with the same name
    let mut merged: HashMap<FolderId, FolderId> = HashMap::new();

    let folders = folders_collection(user_id);
    for id in remote.ids(&folders)? {
        let Some(folder) = fetch::<Folder>(remote, &folders, &id) else {
            report.skipped += 1;
            continue;
        };

        let same_name = store
            .folder_by_name(&folder.name)
            .map(|f| f.id)
            .filter(|local| *local != folder.id);

        match (store.find_folder(folder.id), same_name) {
            (None, Some(local)) => {
                info!("merging backup folder '{}' into {local}", folder.name);
                merged.insert(folder.id, local);
                report.skipped += 1;
                continue;
            }
            (None, None) => report.added += 1,
            (Some(local), None) if folder.updated_at > local.updated_at => report.updated += 1,
            (Some(_), _) => {
                report.skipped += 1;
                continue;
            }
        }
        store.put_folder(folder);
    }

    let notes = notes_collection(user_id);
    for id in remote.ids(&notes)? {
        let Some(mut note) = fetch::<Note>(remote, &notes, &id) else {
            report.skipped += 1;
            continue;
        };

        match store.find_note(note.id) {
            None => report.added += 1,
            Some(local) if note.updated_at > local.updated_at => report.updated += 1,
            Some(_) => {
                report.skipped += 1;
                continue;
            }
        }

        if let Some(local) = note.folder.and_then(|f| merged.get(&f)) {
            note.folder = Some(*local);
        }
        if let Some(folder) = note.folder {
            if store.find_folder(folder).is_none() {
                warn!("note {} refers to missing folder {folder}, unfiling", note.id);
                note.folder = None;
            }
        }
        store.put_note(note);
    }

    info!(
        "restore for {user_id}: {} added, {} updated, {} skipped",
        report.added, report.updated, report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::store::{NoteFilter, SortOrder};

    fn alice() -> Session {
        Session::account("alice")
    }

    #[test]
    fn test_guest_cannot_backup_or_restore() {
        let mut store = NoteStore::in_memory();
        let mut remote = MemoryRemote::default();

        assert!(matches!(
            backup(&store, &mut remote, &Session::Guest),
            Err(Error::GuestSession)
        ));
        assert!(matches!(
            restore(&mut store, &remote, &Session::Guest),
            Err(Error::GuestSession)
        ));
    }

    #[test]
    fn test_backup_then_restore_into_empty_store() {
        let mut store = NoteStore::in_memory();
        let folder = store.create_folder("Trips").unwrap();
        let id = store.create_note("Rome", "* pasta", Some(folder)).unwrap();
        let trashed = store.create_note("old", "", None).unwrap();
        store.trash(trashed).unwrap();

        let mut remote = MemoryRemote::default();
        let report = backup(&store, &mut remote, &alice()).unwrap();
        assert_eq!(report, BackupReport { notes: 2, folders: 1 });

        let mut fresh = NoteStore::in_memory();
        let report = restore(&mut fresh, &remote, &alice()).unwrap();
        assert_eq!(
            report,
            RestoreReport {
                added: 3,
                updated: 0,
                skipped: 0
            }
        );
        assert_eq!(fresh.note(id).unwrap(), store.note(id).unwrap());
        assert_eq!(
            fresh.list(NoteFilter::Trash, SortOrder::NewestFirst).len(),
            1
        );
    }

    #[test]
    fn test_restore_last_write_wins() {
        let mut store = NoteStore::in_memory();
        let id = store.create_note("v1", "", None).unwrap();

        let mut remote = MemoryRemote::default();
        backup(&store, &mut remote, &alice()).unwrap();

        // local edit is newer than the backup
        store.update_note(id, "v2", "").unwrap();
        let report = restore(&mut store, &remote, &alice()).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(store.note(id).unwrap().title, "v2");

        // remote copy newer than local
        let mut newer = store.note(id).unwrap().clone();
        newer.title = "v3".into();
        newer.updated_at = Utc::now() + Duration::seconds(60);
        remote
            .put(
                "users/alice/notes",
                &id.to_string(),
                &serde_json::to_string(&newer).unwrap(),
            )
            .unwrap();

        let report = restore(&mut store, &remote, &alice()).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(store.note(id).unwrap().title, "v3");
    }

    #[test]
    fn test_users_are_isolated() {
        let mut store = NoteStore::in_memory();
        store.create_note("mine", "", None).unwrap();

        let mut remote = MemoryRemote::default();
        backup(&store, &mut remote, &alice()).unwrap();

        let mut other = NoteStore::in_memory();
        let report = restore(&mut other, &remote, &Session::account("bob")).unwrap();
        assert_eq!(report, RestoreReport::default());
        assert_eq!(other.notes().count(), 0);
    }

    #[test]
    fn test_unreadable_entries_skipped() {
        let mut remote = MemoryRemote::default();
        remote.put("users/alice/notes", "junk", "{").unwrap();

        let mut store = NoteStore::in_memory();
        let report = restore(&mut store, &remote, &alice()).unwrap();
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_missing_folder_is_unfiled() {
        let mut source = NoteStore::in_memory();
        let folder = source.create_folder("gone").unwrap();
        let id = source.create_note("n", "", Some(folder)).unwrap();

        let mut remote = MemoryRemote::default();
        remote
            .put(
                "users/alice/notes",
                &id.to_string(),
                &serde_json::to_string(source.note(id).unwrap()).unwrap(),
            )
            .unwrap();

        let mut store = NoteStore::in_memory();
        restore(&mut store, &remote, &alice()).unwrap();
        assert_eq!(store.note(id).unwrap().folder, None);
    }

    #[test]
    fn test_same_named_folders_merge_on_restore() {
        let mut laptop = NoteStore::in_memory();
        let remote_work = laptop.create_folder("Work").unwrap();
        let id = laptop.create_note("plan", "", Some(remote_work)).unwrap();

        let mut remote = MemoryRemote::default();
        backup(&laptop, &mut remote, &alice()).unwrap();

        let mut phone = NoteStore::in_memory();
        let local_work = phone.create_folder("work").unwrap();
        let report = restore(&mut phone, &remote, &alice()).unwrap();
        assert_eq!(report.added, 1);

        let names: Vec<&str> = phone.folders().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["work"]);
        assert_eq!(phone.note(id).unwrap().folder, Some(local_work));
        assert_eq!(
            phone
                .list(NoteFilter::Folder(local_work), SortOrder::NewestFirst)
                .len(),
            1
        );
    }

    #[test]
    fn test_directory_remote() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut remote = DirectoryRemote::new(tmp.path());

        remote.put("users/alice/notes", "a", "{}").unwrap();
        remote.put("users/alice/notes", "b", "[]").unwrap();

        assert_eq!(remote.ids("users/alice/notes").unwrap(), vec!["a", "b"]);
        assert_eq!(
            remote.get("users/alice/notes", "b").unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(remote.get("users/alice/notes", "c").unwrap(), None);
        assert!(remote.ids("users/bob/notes").unwrap().is_empty());
        assert!(remote.put("users/../notes", "x", "{}").is_err());
    }
}
