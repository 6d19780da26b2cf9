use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::session::Session;
use crate::storage::{write_file, DataPath, DataPathType, Directory};
use crate::store::SortOrder;
use crate::Result;

const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_PREVIEW_CHARS: usize = 120;
const DEFAULT_TRASH_RETENTION_DAYS: i64 = 30;

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Settings {
    #[serde(default = "default_newest_first")]
    pub newest_first: bool,

    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    #[serde(default = "default_trash_retention_days")]
    pub trash_retention_days: i64,

    /// Signed-in account; `None` runs as a guest
    #[serde(default)]
    pub account: Option<String>,
}

fn default_newest_first() -> bool {
    true
}

fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}

fn default_trash_retention_days() -> i64 {
    DEFAULT_TRASH_RETENTION_DAYS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            newest_first: default_newest_first(),
            preview_chars: default_preview_chars(),
            trash_retention_days: default_trash_retention_days(),
            account: None,
        }
    }
}

impl Settings {
    pub fn sort_order(&self) -> SortOrder {
        if self.newest_first {
            SortOrder::NewestFirst
        } else {
            SortOrder::OldestFirst
        }
    }

    pub fn trash_retention(&self) -> Duration {
        Duration::days(self.trash_retention_days.max(0))
    }

    pub fn session(&self) -> Session {
        match &self.account {
            Some(user_id) => Session::account(user_id),
            None => Session::Guest,
        }
    }
}

pub struct SettingsHandler {
    directory: Directory,
    current_settings: Option<Settings>,
}

impl SettingsHandler {
    pub fn new(path: &DataPath) -> Self {
        let directory = Directory::new(path.path(DataPathType::Setting));

        Self {
            directory,
            current_settings: None,
        }
    }

    pub fn load(mut self) -> Self {
        match self.directory.get_file(SETTINGS_FILE) {
            Ok(contents_str) => match serde_json::from_str::<Settings>(&contents_str) {
                Ok(settings) => {
                    self.current_settings = Some(settings);
                }
                Err(_) => {
                    error!("Invalid settings format. Using defaults");
                    self.current_settings = Some(Settings::default());
                }
            },
            Err(_) => {
                info!("no settings file yet, using defaults");
                self.current_settings = Some(Settings::default());
            }
        }

        self
    }

    pub fn settings(&self) -> Settings {
        self.current_settings.clone().unwrap_or_default()
    }

    pub fn get_settings_mut(&mut self) -> &mut Settings {
        self.current_settings.get_or_insert_with(Settings::default)
    }

    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string_pretty(self.get_settings_mut())?;
        write_file(&self.directory.file_path, SETTINGS_FILE, &json)?;
        info!("wrote settings {}", json);
        Ok(())
    }

    pub fn update_batch<F>(&mut self, update_fn: F) -> Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        update_fn(self.get_settings_mut());
        self.save()
    }

    pub fn sign_in<S>(&mut self, user_id: S) -> Result<()>
    where
        S: Into<String>,
    {
        self.get_settings_mut().account = Some(user_id.into());
        self.save()
    }

    pub fn sign_out(&mut self) -> Result<()> {
        self.get_settings_mut().account = None;
        self.save()
    }

    pub fn session(&self) -> Session {
        self.current_settings
            .as_ref()
            .map(|s| s.session())
            .unwrap_or(Session::Guest)
    }

    pub fn preview_chars(&self) -> usize {
        self.current_settings
            .as_ref()
            .map(|s| s.preview_chars)
            .unwrap_or(DEFAULT_PREVIEW_CHARS)
    }
}
