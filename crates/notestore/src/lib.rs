//! Notes, folders, trash and backup for a markdown note-taking app.

pub mod assistant;
pub mod backup;
mod error;
pub mod note;
mod result;
mod session;
mod settings;
pub mod storage;
mod store;

pub use backup::{
    backup, restore, BackupRemote, BackupReport, DirectoryRemote, MemoryRemote, RestoreReport,
};
pub use error::{Error, FolderError};
pub use note::{Folder, FolderId, Note, NoteId};
pub use result::Result;
pub use session::Session;
pub use settings::{Settings, SettingsHandler};
pub use storage::{DataPath, DataPathType, Directory};
pub use store::{NoteFilter, NoteStore, SortOrder};
