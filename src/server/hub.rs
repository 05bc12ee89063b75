//! Change-feed fanout for the sync server.
//!
//! Every document write is broadcast to all WebSocket subscribers of that
//! user, the writer's own connection included. Clients rely on the echo to
//! confirm their write landed; suppressing their own echoes is the
//! client's job, not the server's.

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};

use crate::remote::DocKind;

/// One change-feed notification: the document kind and its new contents.
#[derive(Debug, Clone)]
pub struct FeedUpdate {
    pub kind: DocKind,
    pub doc: serde_json::Value,
}

/// Tracks all connected feed subscribers, keyed by user.
pub struct FeedHub {
    channels: RwLock<HashMap<String, broadcast::Sender<FeedUpdate>>>,
}

impl FeedHub {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes to document updates for a user.
    pub async fn subscribe(&self, user_id: &str) -> broadcast::Receiver<FeedUpdate> {
        let mut channels = self.channels.write().await;
        if let Some(sender) = channels.get(user_id) {
            sender.subscribe()
        } else {
            let (sender, receiver) = broadcast::channel(16);
            channels.insert(user_id.to_string(), sender);
            receiver
        }
    }

    /// Broadcasts a document update to all of a user's subscribers.
    pub async fn broadcast(&self, user_id: &str, kind: DocKind, doc: serde_json::Value) {
        let channels = self.channels.read().await;
        if let Some(sender) = channels.get(user_id) {
            // Ignore send errors (no subscribers)
            let _ = sender.send(FeedUpdate { kind, doc });
        }
    }
}

impl Default for FeedHub {
    fn default() -> Self {
        Self::new()
    }
}
