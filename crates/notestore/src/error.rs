use std::io;

use crate::note::{FolderId, NoteId};

/// Note library errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("note not found: {0}")]
    NoteNotFound(NoteId),

    #[error("folder not found: {0}")]
    FolderNotFound(FolderId),

    #[error("invalid folder name: {0}")]
    Folder(FolderError),

    /// Permanent deletion is only allowed from the trash
    #[error("note is not in the trash: {0}")]
    NotInTrash(NoteId),

    #[error("guest sessions cannot use cloud backup")]
    GuestSession,

    #[error("assistant error: {0}")]
    Assistant(String),

    #[error("generic error: {0}")]
    Generic(String),
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FolderError {
    #[error("name is empty")]
    Empty,

    #[error("a folder named '{0}' already exists")]
    Duplicate(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

impl Error {
    pub fn empty_folder_name() -> Self {
        Error::Folder(FolderError::Empty)
    }

    pub fn duplicate_folder(name: &str) -> Self {
        Error::Folder(FolderError::Duplicate(name.to_owned()))
    }
}
