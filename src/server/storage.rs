//! Server-side document storage.
//!
//! Stores JSON documents per user in the following structure:
//! ```text
//! <DATA_DIR>/
//!   <user_id>/
//!     recipes.json
//!     settings.json
//!     backups/
//!       <backup_id>.json
//! ```
//!
//! Documents are opaque to the server; it stores and relays whatever JSON
//! the client last wrote.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::Utc;

use crate::remote::DocKind;

/// Errors that can occur during server storage operations.
#[derive(Debug)]
pub enum ServerStorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// A stored document is not valid JSON.
    CorruptDocument(PathBuf, serde_json::Error),
    /// Invalid user ID (e.g., contains path separators).
    InvalidUserId(String),
    /// Invalid backup ID.
    InvalidBackupId(String),
}

impl std::fmt::Display for ServerStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            ServerStorageError::CorruptDocument(path, e) => {
                write!(f, "Corrupt document {}: {}", path.display(), e)
            }
            ServerStorageError::InvalidUserId(id) => {
                write!(f, "Invalid user ID: {}", id)
            }
            ServerStorageError::InvalidBackupId(id) => {
                write!(f, "Invalid backup ID: {}", id)
            }
        }
    }
}

impl std::error::Error for ServerStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerStorageError::IoError(_, e) => Some(e),
            ServerStorageError::CorruptDocument(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Summary entry returned by [`ServerStorage::list_backups`].
#[derive(Debug, Clone)]
pub struct StoredBackup {
    pub id: String,
    pub created_at: chrono::DateTime<Utc>,
}

/// Server-side storage for per-user JSON documents.
#[derive(Debug, Clone)]
pub struct ServerStorage {
    data_dir: PathBuf,
}

impl ServerStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Validates a user ID to prevent path traversal attacks.
    fn validate_user_id(user_id: &str) -> Result<(), ServerStorageError> {
        if user_id.is_empty()
            || user_id.contains('/')
            || user_id.contains('\\')
            || user_id.contains("..")
            || user_id.starts_with('.')
        {
            return Err(ServerStorageError::InvalidUserId(user_id.to_string()));
        }
        Ok(())
    }

    /// Backup IDs are generated server-side as decimal timestamps; anything
    /// else in the URL is rejected before it touches the filesystem.
    fn validate_backup_id(id: &str) -> Result<(), ServerStorageError> {
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ServerStorageError::InvalidBackupId(id.to_string()));
        }
        Ok(())
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.data_dir.join(user_id)
    }

    fn doc_path(&self, user_id: &str, kind: DocKind) -> PathBuf {
        self.user_dir(user_id).join(format!("{}.json", kind.name()))
    }

    fn backups_dir(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("backups")
    }

    fn backup_path(&self, user_id: &str, id: &str) -> PathBuf {
        self.backups_dir(user_id).join(format!("{}.json", id))
    }

    fn write_json(
        path: &PathBuf,
        doc: &serde_json::Value,
    ) -> Result<(), ServerStorageError> {
        let parent = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&parent).map_err(|e| ServerStorageError::IoError(parent, e))?;

        let bytes = serde_json::to_vec(doc).expect("JSON value always serializes");

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, bytes)
            .map_err(|e| ServerStorageError::IoError(temp_path.clone(), e))?;
        fs::rename(&temp_path, path)
            .map_err(|e| ServerStorageError::IoError(path.clone(), e))?;
        Ok(())
    }

    fn read_json(path: &PathBuf) -> Result<Option<serde_json::Value>, ServerStorageError> {
        match fs::read(path) {
            Ok(bytes) => {
                let doc = serde_json::from_slice(&bytes)
                    .map_err(|e| ServerStorageError::CorruptDocument(path.clone(), e))?;
                Ok(Some(doc))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ServerStorageError::IoError(path.clone(), e)),
        }
    }

    /// Loads a user's document. Returns `Ok(None)` if it doesn't exist yet.
    pub fn load(
        &self,
        user_id: &str,
        kind: DocKind,
    ) -> Result<Option<serde_json::Value>, ServerStorageError> {
        Self::validate_user_id(user_id)?;
        Self::read_json(&self.doc_path(user_id, kind))
    }

    /// Saves a user's document, creating the user directory if needed.
    pub fn save(
        &self,
        user_id: &str,
        kind: DocKind,
        doc: &serde_json::Value,
    ) -> Result<(), ServerStorageError> {
        Self::validate_user_id(user_id)?;
        Self::write_json(&self.doc_path(user_id, kind), doc)
    }

    /// Checks if a user's document exists.
    pub fn exists(&self, user_id: &str, kind: DocKind) -> Result<bool, ServerStorageError> {
        Self::validate_user_id(user_id)?;
        Ok(self.doc_path(user_id, kind).exists())
    }

    /// Stores a backup document and returns its assigned ID.
    pub fn create_backup(
        &self,
        user_id: &str,
        doc: &serde_json::Value,
    ) -> Result<String, ServerStorageError> {
        Self::validate_user_id(user_id)?;

        let mut id = Utc::now().timestamp_millis();
        while self.backup_path(user_id, &id.to_string()).exists() {
            id += 1;
        }
        let id = id.to_string();
        Self::write_json(&self.backup_path(user_id, &id), doc)?;
        Ok(id)
    }

    /// Lists a user's backups, newest first.
    pub fn list_backups(&self, user_id: &str) -> Result<Vec<StoredBackup>, ServerStorageError> {
        Self::validate_user_id(user_id)?;

        let dir = self.backups_dir(user_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ServerStorageError::IoError(dir, e)),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ServerStorageError::IoError(dir.clone(), e))?;
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            let Ok(millis) = id.parse::<i64>() else {
                continue;
            };
            let Some(created_at) = chrono::DateTime::from_timestamp_millis(millis) else {
                continue;
            };
            backups.push(StoredBackup {
                id: id.to_string(),
                created_at,
            });
        }
        backups.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(backups)
    }

    /// Loads a backup. Returns `Ok(None)` if no such backup exists.
    pub fn load_backup(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<serde_json::Value>, ServerStorageError> {
        Self::validate_user_id(user_id)?;
        Self::validate_backup_id(id)?;
        Self::read_json(&self.backup_path(user_id, id))
    }

    /// Deletes a backup. Returns whether it existed.
    pub fn delete_backup(&self, user_id: &str, id: &str) -> Result<bool, ServerStorageError> {
        Self::validate_user_id(user_id)?;
        Self::validate_backup_id(id)?;

        let path = self.backup_path(user_id, id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ServerStorageError::IoError(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (ServerStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = ServerStorage::new(temp_dir.path());
        (storage, temp_dir)
    }

    #[test]
    fn test_validate_user_id() {
        assert!(ServerStorage::validate_user_id("erik").is_ok());
        assert!(ServerStorage::validate_user_id("user-123").is_ok());

        assert!(ServerStorage::validate_user_id("").is_err());
        assert!(ServerStorage::validate_user_id("../evil").is_err());
        assert!(ServerStorage::validate_user_id("foo/bar").is_err());
        assert!(ServerStorage::validate_user_id("foo\\bar").is_err());
        assert!(ServerStorage::validate_user_id(".hidden").is_err());
    }

    #[test]
    fn test_load_nonexistent_returns_none() {
        let (storage, _temp) = setup();
        assert!(storage.load("user1", DocKind::Recipes).unwrap().is_none());
        assert!(!storage.exists("user1", DocKind::Recipes).unwrap());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (storage, temp) = setup();
        let doc = json!({"recipes": [], "lastUpdated": "2026-01-01T00:00:00Z"});

        storage.save("user1", DocKind::Recipes, &doc).unwrap();

        assert!(storage.exists("user1", DocKind::Recipes).unwrap());
        assert_eq!(storage.load("user1", DocKind::Recipes).unwrap(), Some(doc));
        assert!(temp.path().join("user1").join("recipes.json").exists());
    }

    #[test]
    fn test_users_and_kinds_are_isolated() {
        let (storage, _temp) = setup();
        storage
            .save("user1", DocKind::Recipes, &json!({"who": "one"}))
            .unwrap();
        storage
            .save("user2", DocKind::Recipes, &json!({"who": "two"}))
            .unwrap();
        storage
            .save("user1", DocKind::Settings, &json!({"kind": "settings"}))
            .unwrap();

        assert_eq!(
            storage.load("user1", DocKind::Recipes).unwrap(),
            Some(json!({"who": "one"}))
        );
        assert_eq!(
            storage.load("user2", DocKind::Recipes).unwrap(),
            Some(json!({"who": "two"}))
        );
        assert_eq!(
            storage.load("user1", DocKind::Settings).unwrap(),
            Some(json!({"kind": "settings"}))
        );
    }

    #[test]
    fn test_overwrite_existing() {
        let (storage, _temp) = setup();
        storage
            .save("user1", DocKind::Settings, &json!({"version": 1}))
            .unwrap();
        storage
            .save("user1", DocKind::Settings, &json!({"version": 2}))
            .unwrap();
        assert_eq!(
            storage.load("user1", DocKind::Settings).unwrap(),
            Some(json!({"version": 2}))
        );
    }

    #[test]
    fn test_backup_lifecycle() {
        let (storage, _temp) = setup();
        let doc = json!({"recipes": [], "settings": {}, "createdAt": "2026-01-01T00:00:00Z"});

        let id = storage.create_backup("user1", &doc).unwrap();
        let listed = storage.list_backups("user1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);

        assert_eq!(storage.load_backup("user1", &id).unwrap(), Some(doc));

        assert!(storage.delete_backup("user1", &id).unwrap());
        assert!(!storage.delete_backup("user1", &id).unwrap());
        assert!(storage.load_backup("user1", &id).unwrap().is_none());
        assert!(storage.list_backups("user1").unwrap().is_empty());
    }

    #[test]
    fn test_backup_ids_never_collide() {
        let (storage, _temp) = setup();
        let a = storage.create_backup("user1", &json!({})).unwrap();
        let b = storage.create_backup("user1", &json!({})).unwrap();
        assert_ne!(a, b);
        assert_eq!(storage.list_backups("user1").unwrap().len(), 2);
    }

    #[test]
    fn test_backup_id_validation() {
        let (storage, _temp) = setup();
        assert!(storage.load_backup("user1", "../secret").is_err());
        assert!(storage.delete_backup("user1", "not-a-number").is_err());
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let (storage, temp) = setup();
        let dir = temp.path().join("user1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("recipes.json"), "{not json").unwrap();

        assert!(matches!(
            storage.load("user1", DocKind::Recipes),
            Err(ServerStorageError::CorruptDocument(_, _))
        ));
    }
}
