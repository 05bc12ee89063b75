//! Remote mirror client.
//!
//! Abstraction over the per-user cloud document store. Documents are
//! overwritten whole (last-write-wins at document granularity, no field
//! merge); the live feed delivers full snapshots and re-fires for this
//! client's own writes, which the sync coordinator must recognize as
//! echoes. Backups live beside the two live documents and are never
//! streamed.

mod http;
mod memory;

pub use http::HttpMirror;
pub use memory::MemoryMirror;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::models::{Backup, BackupInfo, Recipe, UserSettings};

/// The two live-synced document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    Recipes,
    Settings,
}

impl DocKind {
    pub fn name(&self) -> &'static str {
        match self {
            DocKind::Recipes => "recipes",
            DocKind::Settings => "settings",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "recipes" => Some(DocKind::Recipes),
            "settings" => Some(DocKind::Settings),
            _ => None,
        }
    }
}

/// Wire shape of the remote recipes document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipesDoc {
    pub recipes: Vec<Recipe>,
    pub last_updated: DateTime<Utc>,
}

impl RecipesDoc {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self {
            recipes,
            last_updated: Utc::now(),
        }
    }
}

/// Wire shape of the remote settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDoc {
    pub settings: UserSettings,
    pub last_updated: DateTime<Utc>,
}

impl SettingsDoc {
    pub fn new(settings: UserSettings) -> Self {
        Self {
            settings,
            last_updated: Utc::now(),
        }
    }
}

/// Errors from remote mirror operations. Never fatal: the session degrades
/// to local-only mode while these occur.
#[derive(Debug)]
pub enum RemoteError {
    /// Sync is not configured (no server URL or API key).
    NotConfigured,
    /// Failed to reach the server.
    Connection(String),
    /// The server rejected the request.
    Status(u16, String),
    /// Response body could not be decoded.
    Decode(String),
    /// WebSocket feed error.
    Feed(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::NotConfigured => write!(
                f,
                "Sync not configured. Add server_url and api_key to config."
            ),
            RemoteError::Connection(e) => write!(f, "Connection error: {}", e),
            RemoteError::Status(code, msg) => write!(f, "Server error {}: {}", code, msg),
            RemoteError::Decode(e) => write!(f, "Decode error: {}", e),
            RemoteError::Feed(e) => write!(f, "Feed error: {}", e),
        }
    }
}

impl std::error::Error for RemoteError {}

/// A full-document snapshot delivered by the live feed.
#[derive(Debug, Clone)]
pub enum RemoteEvent {
    Recipes(RecipesDoc),
    Settings(SettingsDoc),
}

impl RemoteEvent {
    pub fn kind(&self) -> DocKind {
        match self {
            RemoteEvent::Recipes(_) => DocKind::Recipes,
            RemoteEvent::Settings(_) => DocKind::Settings,
        }
    }
}

/// Handle to a live document feed.
///
/// Dropping the handle or calling [`unsubscribe`](Self::unsubscribe) stops
/// the underlying pump. Unsubscribing is synchronous and idempotent:
/// calling it repeatedly, or after the transport already dropped, is fine.
pub struct Subscription {
    events: mpsc::Receiver<RemoteEvent>,
    stop: watch::Sender<bool>,
}

impl Subscription {
    pub fn new(events: mpsc::Receiver<RemoteEvent>, stop: watch::Sender<bool>) -> Self {
        Self { events, stop }
    }

    /// Next snapshot, or `None` once the feed has closed.
    pub async fn next(&mut self) -> Option<RemoteEvent> {
        self.events.recv().await
    }

    pub fn unsubscribe(&self) {
        // Ignore send errors: the pump may already be gone.
        let _ = self.stop.send(true);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Per-user remote document store.
pub trait RemoteMirror {
    /// Whether the remote already holds a document of this kind for the
    /// user. Checked once at session start to pick the bootstrap direction.
    fn exists(
        &self,
        kind: DocKind,
    ) -> impl std::future::Future<Output = Result<bool, RemoteError>> + Send;

    fn get_recipes(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<RecipesDoc>, RemoteError>> + Send;

    fn get_settings(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<SettingsDoc>, RemoteError>> + Send;

    /// Overwrites the remote recipes document.
    fn put_recipes(
        &self,
        recipes: &[Recipe],
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;

    /// Overwrites the remote settings document.
    fn put_settings(
        &self,
        settings: &UserSettings,
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;

    /// Opens the live feed for both document kinds.
    fn subscribe(
        &self,
    ) -> impl std::future::Future<Output = Result<Subscription, RemoteError>> + Send;

    fn create_backup(
        &self,
        backup: &Backup,
    ) -> impl std::future::Future<Output = Result<String, RemoteError>> + Send;

    fn list_backups(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<BackupInfo>, RemoteError>> + Send;

    fn get_backup(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Backup>, RemoteError>> + Send;

    fn delete_backup(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;
}
