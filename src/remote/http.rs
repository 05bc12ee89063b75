//! HTTP mirror client for the filmdeck sync server.
//!
//! Documents travel as JSON over plain HTTP; the live feed is a WebSocket
//! that the server pushes `{kind, doc}` frames on whenever a document is
//! written, the client's own writes included.

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{
    DocKind, RecipesDoc, RemoteError, RemoteEvent, RemoteMirror, SettingsDoc, Subscription,
};
use crate::config::SyncConfig;
use crate::models::{Backup, BackupInfo, Recipe, UserSettings};

/// Client for a filmdeck-server remote mirror.
pub struct HttpMirror {
    server_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

/// One change-feed frame from the server.
#[derive(Deserialize)]
struct FeedFrame {
    kind: String,
    doc: serde_json::Value,
}

impl HttpMirror {
    /// Creates a mirror client from config. Errors if sync is not
    /// configured.
    pub fn from_config(config: &SyncConfig) -> Result<Self, RemoteError> {
        let server_url = config
            .server_url
            .clone()
            .ok_or(RemoteError::NotConfigured)?;
        let api_key = config.api_key.clone().ok_or(RemoteError::NotConfigured)?;
        Ok(Self::new(server_url, api_key))
    }

    pub fn new(server_url: String, api_key: String) -> Self {
        Self {
            server_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn http_url(&self, path: &str) -> String {
        format!("{}/{}", self.server_url.trim_end_matches('/'), path)
    }

    /// Builds the WebSocket URL for the change feed, converting the
    /// configured scheme as needed.
    fn feed_url(&self) -> String {
        let base_url = if self.server_url.starts_with("http://") {
            self.server_url.replace("http://", "ws://")
        } else if self.server_url.starts_with("https://") {
            self.server_url.replace("https://", "wss://")
        } else if !self.server_url.starts_with("ws://") && !self.server_url.starts_with("wss://") {
            format!("ws://{}", self.server_url)
        } else {
            self.server_url.clone()
        };
        format!(
            "{}/sync?key={}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(&self.api_key)
        )
    }

    async fn get_doc<T: serde::de::DeserializeOwned>(
        &self,
        kind: DocKind,
    ) -> Result<Option<T>, RemoteError> {
        let response = self
            .client
            .get(self.http_url(&format!("data/{}", kind.name())))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response)?;
        let doc = response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(Some(doc))
    }

    async fn put_doc<T: serde::Serialize>(
        &self,
        kind: DocKind,
        doc: &T,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .put(self.http_url(&format!("data/{}", kind.name())))
            .bearer_auth(&self.api_key)
            .json(doc)
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(RemoteError::Status(
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown").to_string(),
        ))
    }
}

fn parse_frame(text: &str) -> Option<RemoteEvent> {
    let frame: FeedFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Unparseable feed frame: {}", e);
            return None;
        }
    };
    match DocKind::parse(&frame.kind) {
        Some(DocKind::Recipes) => match serde_json::from_value::<RecipesDoc>(frame.doc) {
            Ok(doc) => Some(RemoteEvent::Recipes(doc)),
            Err(e) => {
                tracing::warn!("Malformed recipes snapshot on feed: {}", e);
                None
            }
        },
        Some(DocKind::Settings) => match serde_json::from_value::<SettingsDoc>(frame.doc) {
            Ok(doc) => Some(RemoteEvent::Settings(doc)),
            Err(e) => {
                tracing::warn!("Malformed settings snapshot on feed: {}", e);
                None
            }
        },
        None => {
            tracing::warn!("Unknown document kind on feed: {}", frame.kind);
            None
        }
    }
}

impl RemoteMirror for HttpMirror {
    async fn exists(&self, kind: DocKind) -> Result<bool, RemoteError> {
        let response = self
            .client
            .get(self.http_url(&format!("data/{}", kind.name())))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(RemoteError::Status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown").to_string(),
            )),
        }
    }

    async fn get_recipes(&self) -> Result<Option<RecipesDoc>, RemoteError> {
        self.get_doc(DocKind::Recipes).await
    }

    async fn get_settings(&self) -> Result<Option<SettingsDoc>, RemoteError> {
        self.get_doc(DocKind::Settings).await
    }

    async fn put_recipes(&self, recipes: &[Recipe]) -> Result<(), RemoteError> {
        self.put_doc(DocKind::Recipes, &RecipesDoc::new(recipes.to_vec()))
            .await
    }

    async fn put_settings(&self, settings: &UserSettings) -> Result<(), RemoteError> {
        self.put_doc(DocKind::Settings, &SettingsDoc::new(settings.clone()))
            .await
    }

    async fn subscribe(&self) -> Result<Subscription, RemoteError> {
        let (ws_stream, _) = connect_async(&self.feed_url())
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let (mut sender, mut receiver) = ws_stream.split();

        let (tx, rx) = mpsc::channel(32);
        let (stop_tx, mut stop_rx) = watch::channel(false);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            let _ = sender.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    message = receiver.next() => match message {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(event) = parse_frame(&text) {
                                if tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = sender.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!("Change feed error: {}", e);
                            break;
                        }
                    },
                }
            }
        });

        Ok(Subscription::new(rx, stop_tx))
    }

    async fn create_backup(&self, backup: &Backup) -> Result<String, RemoteError> {
        let response = self
            .client
            .post(self.http_url("backups"))
            .bearer_auth(&self.api_key)
            .json(backup)
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let response = check_status(response)?;
        let created: CreatedResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(created.id)
    }

    async fn list_backups(&self) -> Result<Vec<BackupInfo>, RemoteError> {
        let response = self
            .client
            .get(self.http_url("backups"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let response = check_status(response)?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn get_backup(&self, id: &str) -> Result<Option<Backup>, RemoteError> {
        let response = self
            .client
            .get(self.http_url(&format!("backups/{}", id)))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response)?;
        let backup = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(Some(backup))
    }

    async fn delete_backup(&self, id: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.http_url(&format!("backups/{}", id)))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        check_status(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url_with_http() {
        let mirror = HttpMirror::new("http://localhost:8080".to_string(), "test-key".to_string());
        assert_eq!(mirror.feed_url(), "ws://localhost:8080/sync?key=test-key");
    }

    #[test]
    fn test_feed_url_with_https() {
        let mirror = HttpMirror::new("https://sync.example.com".to_string(), "k".to_string());
        assert_eq!(mirror.feed_url(), "wss://sync.example.com/sync?key=k");
    }

    #[test]
    fn test_feed_url_bare_host_and_key_encoding() {
        let mirror = HttpMirror::new("localhost:8080".to_string(), "a key".to_string());
        assert_eq!(mirror.feed_url(), "ws://localhost:8080/sync?key=a%20key");
    }

    #[test]
    fn test_http_url_trims_trailing_slash() {
        let mirror = HttpMirror::new("http://localhost:8080/".to_string(), "k".to_string());
        assert_eq!(
            mirror.http_url("data/recipes"),
            "http://localhost:8080/data/recipes"
        );
    }

    #[test]
    fn test_parse_frame_dispatch() {
        let frame = r#"{"kind": "recipes", "doc": {"recipes": [], "lastUpdated": "2026-01-01T00:00:00Z"}}"#;
        match parse_frame(frame) {
            Some(RemoteEvent::Recipes(doc)) => assert!(doc.recipes.is_empty()),
            other => panic!("expected recipes event, got {:?}", other.map(|e| e.kind())),
        }

        assert!(parse_frame(r#"{"kind": "unknown", "doc": {}}"#).is_none());
        assert!(parse_frame("not json").is_none());
    }
}
