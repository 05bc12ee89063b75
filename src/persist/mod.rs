//! Local JSON persistence.
//!
//! One blob per document kind under the data directory:
//! ```text
//! <data_dir>/
//!   recipes.json
//!   settings.json
//! ```
//! Writes go through a temp file and rename so the last write wins
//! atomically for a given key. Local durability is best-effort: save
//! failures are logged and swallowed, the in-memory store stays correct
//! for the session.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::models::{Recipe, UserSettings};

#[derive(Debug)]
pub enum PersistError {
    Io(PathBuf, io::Error),
    Serialize(serde_json::Error),
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::Io(path, e) => write!(f, "I/O error for {}: {}", path.display(), e),
            PersistError::Serialize(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(_, e) => Some(e),
            PersistError::Serialize(e) => Some(e),
        }
    }
}

/// Durable local key-value store for the session state.
#[derive(Debug, Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    fn write(&self, key: &str, json: String) -> Result<(), PersistError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| PersistError::Io(self.data_dir.clone(), e))?;
        let path = self.path(key);
        let tmp = self.data_dir.join(format!("{}.json.tmp", key));
        fs::write(&tmp, json).map_err(|e| PersistError::Io(tmp.clone(), e))?;
        fs::rename(&tmp, &path).map_err(|e| PersistError::Io(path, e))?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistError::Io(path, e)),
        }
    }

    /// Writes the recipe collection. Fire-and-forget: failures are logged.
    pub fn save_recipes(&self, recipes: &[Recipe]) {
        let result = serde_json::to_string_pretty(recipes)
            .map_err(PersistError::Serialize)
            .and_then(|json| self.write("recipes", json));
        if let Err(e) = result {
            tracing::warn!("Failed to persist recipes locally: {}", e);
        }
    }

    /// Writes the settings object. Fire-and-forget: failures are logged.
    pub fn save_settings(&self, settings: &UserSettings) {
        let result = serde_json::to_string_pretty(settings)
            .map_err(PersistError::Serialize)
            .and_then(|json| self.write("settings", json));
        if let Err(e) = result {
            tracing::warn!("Failed to persist settings locally: {}", e);
        }
    }

    /// Reads the recipe collection back, if one was saved. Unreadable or
    /// corrupt data is logged and treated as absent.
    pub fn load_recipes(&self) -> Option<Vec<Recipe>> {
        self.load_json("recipes")
    }

    /// Reads the settings back, if saved.
    pub fn load_settings(&self) -> Option<UserSettings> {
        self.load_json("settings")
    }

    fn load_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let contents = match self.read(key) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read local {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Corrupt local {}: {}", key, e);
                None
            }
        }
    }
}
