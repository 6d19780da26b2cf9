use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

id_type!(NoteId);
id_type!(FolderId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,

    /// Markdown source as typed by the user
    pub content: String,

    #[serde(default)]
    pub folder: Option<FolderId>,

    #[serde(default)]
    pub favorite: bool,

    /// Set while the note sits in the trash
    #[serde(default)]
    pub trashed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: NoteId::new(),
            title: title.into(),
            content: content.into(),
            folder: None,
            favorite: false,
            trashed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_trashed(&self) -> bool {
        self.trashed_at.is_some()
    }

    /// The title, or the first line of plain content for untitled notes.
    pub fn display_title(&self) -> String {
        let title = self.title.trim();
        if !title.is_empty() {
            return title.to_string();
        }

        notemark::strip(&self.content)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub created_at: DateTime<Utc>,

    /// Renames count as updates for backup merging
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: FolderId::new(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip_through_string() {
        let id = NoteId::new();
        let parsed: NoteId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<NoteId>().is_err());
    }

    #[test]
    fn test_display_title_falls_back_to_content() {
        let note = Note::new("  ", "# **Trip** plan\nday one", Utc::now());
        assert_eq!(note.display_title(), "Trip plan");

        let titled = Note::new("Groceries", "milk", Utc::now());
        assert_eq!(titled.display_title(), "Groceries");
    }

    #[test]
    fn test_old_documents_default_missing_fields() {
        let json = r#"{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "title": "t",
            "content": "c",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z"
        }"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert!(!note.favorite);
        assert!(note.folder.is_none());
        assert!(!note.is_trashed());
    }
}
