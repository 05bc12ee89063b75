//! In-process mirror implementation.
//!
//! Backs the coordinator tests and offline experiments with the same
//! observable behavior as the real server: documents are overwritten
//! whole, and every put echoes back through all live feeds, including the
//! writer's own.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc, watch};

use super::{
    DocKind, RecipesDoc, RemoteError, RemoteEvent, RemoteMirror, SettingsDoc, Subscription,
};
use crate::models::{Backup, BackupInfo, Recipe, UserSettings};

#[derive(Default)]
struct MirrorState {
    recipes: Option<RecipesDoc>,
    settings: Option<SettingsDoc>,
    backups: BTreeMap<String, Backup>,
    recipe_puts: usize,
    settings_puts: usize,
}

/// An in-memory remote mirror shared by any number of "devices".
#[derive(Clone)]
pub struct MemoryMirror {
    state: Arc<Mutex<MirrorState>>,
    feed: broadcast::Sender<RemoteEvent>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(32);
        Self {
            state: Arc::new(Mutex::new(MirrorState::default())),
            feed,
        }
    }

    /// Number of put calls seen for a document kind.
    pub fn put_count(&self, kind: DocKind) -> usize {
        let state = self.state.lock().unwrap();
        match kind {
            DocKind::Recipes => state.recipe_puts,
            DocKind::Settings => state.settings_puts,
        }
    }

    /// Current remote recipes, for assertions.
    pub fn recipes_snapshot(&self) -> Option<Vec<Recipe>> {
        let state = self.state.lock().unwrap();
        state.recipes.as_ref().map(|d| d.recipes.clone())
    }

    /// Seeds the remote recipes document without counting as a client put
    /// and without echoing, as if another device wrote before this session.
    pub fn seed_recipes(&self, recipes: Vec<Recipe>) {
        let mut state = self.state.lock().unwrap();
        state.recipes = Some(RecipesDoc::new(recipes));
    }

    /// Seeds the remote settings document, see [`seed_recipes`](Self::seed_recipes).
    pub fn seed_settings(&self, settings: UserSettings) {
        let mut state = self.state.lock().unwrap();
        state.settings = Some(SettingsDoc::new(settings));
    }

    /// Stores a snapshot and pushes it through the feed, simulating a put
    /// from another device.
    pub fn emit(&self, event: RemoteEvent) {
        match &event {
            RemoteEvent::Recipes(doc) => {
                self.state.lock().unwrap().recipes = Some(doc.clone());
            }
            RemoteEvent::Settings(doc) => {
                self.state.lock().unwrap().settings = Some(doc.clone());
            }
        }
        let _ = self.feed.send(event);
    }
}

impl Default for MemoryMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteMirror for MemoryMirror {
    async fn exists(&self, kind: DocKind) -> Result<bool, RemoteError> {
        let state = self.state.lock().unwrap();
        Ok(match kind {
            DocKind::Recipes => state.recipes.is_some(),
            DocKind::Settings => state.settings.is_some(),
        })
    }

    async fn get_recipes(&self) -> Result<Option<RecipesDoc>, RemoteError> {
        Ok(self.state.lock().unwrap().recipes.clone())
    }

    async fn get_settings(&self) -> Result<Option<SettingsDoc>, RemoteError> {
        Ok(self.state.lock().unwrap().settings.clone())
    }

    async fn put_recipes(&self, recipes: &[Recipe]) -> Result<(), RemoteError> {
        let doc = RecipesDoc::new(recipes.to_vec());
        {
            let mut state = self.state.lock().unwrap();
            state.recipes = Some(doc.clone());
            state.recipe_puts += 1;
        }
        // Echo to every subscriber, the writer included.
        let _ = self.feed.send(RemoteEvent::Recipes(doc));
        Ok(())
    }

    async fn put_settings(&self, settings: &UserSettings) -> Result<(), RemoteError> {
        let doc = SettingsDoc::new(settings.clone());
        {
            let mut state = self.state.lock().unwrap();
            state.settings = Some(doc.clone());
            state.settings_puts += 1;
        }
        let _ = self.feed.send(RemoteEvent::Settings(doc));
        Ok(())
    }

    async fn subscribe(&self) -> Result<Subscription, RemoteError> {
        let mut feed = self.feed.subscribe();
        let (tx, rx) = mpsc::channel(32);
        let (stop_tx, mut stop_rx) = watch::channel(false);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    event = feed.recv() => match event {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(Subscription::new(rx, stop_tx))
    }

    async fn create_backup(&self, backup: &Backup) -> Result<String, RemoteError> {
        let mut state = self.state.lock().unwrap();
        let mut id = backup.created_at.timestamp_millis();
        while state.backups.contains_key(&id.to_string()) {
            id += 1;
        }
        let id = id.to_string();
        state.backups.insert(id.clone(), backup.clone());
        Ok(id)
    }

    async fn list_backups(&self) -> Result<Vec<BackupInfo>, RemoteError> {
        let state = self.state.lock().unwrap();
        let mut infos: Vec<BackupInfo> = state
            .backups
            .iter()
            .map(|(id, backup)| BackupInfo {
                id: id.clone(),
                created_at: backup.created_at,
            })
            .collect();
        infos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(infos)
    }

    async fn get_backup(&self, id: &str) -> Result<Option<Backup>, RemoteError> {
        Ok(self.state.lock().unwrap().backups.get(id).cloned())
    }

    async fn delete_backup(&self, id: &str) -> Result<(), RemoteError> {
        self.state.lock().unwrap().backups.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilmSimulation, SensorType};

    fn recipe(name: &str) -> Recipe {
        Recipe::new(name, "tester", SensorType::XTransV, FilmSimulation::Provia)
    }

    #[tokio::test]
    async fn test_exists_reflects_puts() {
        let mirror = MemoryMirror::new();
        assert!(!mirror.exists(DocKind::Recipes).await.unwrap());

        mirror.put_recipes(&[recipe("A")]).await.unwrap();
        assert!(mirror.exists(DocKind::Recipes).await.unwrap());
        assert!(!mirror.exists(DocKind::Settings).await.unwrap());
    }

    #[tokio::test]
    async fn test_put_echoes_to_own_subscription() {
        let mirror = MemoryMirror::new();
        let mut sub = mirror.subscribe().await.unwrap();

        mirror.put_recipes(&[recipe("Echoed")]).await.unwrap();

        match sub.next().await.unwrap() {
            RemoteEvent::Recipes(doc) => assert_eq!(doc.recipes[0].name, "Echoed"),
            other => panic!("expected recipes event, got {:?}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_unsubscribed_feed_stops() {
        let mirror = MemoryMirror::new();
        let mut sub = mirror.subscribe().await.unwrap();
        sub.unsubscribe();

        // Give the pump a turn to observe the stop signal.
        tokio::task::yield_now().await;
        mirror.put_recipes(&[recipe("After stop")]).await.unwrap();

        // The feed closes rather than delivering post-stop events.
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_backup_lifecycle() {
        let mirror = MemoryMirror::new();
        let backup = Backup::new(vec![recipe("Saved")], UserSettings::default());

        let id = mirror.create_backup(&backup).await.unwrap();
        let listed = mirror.list_backups().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);

        let restored = mirror.get_backup(&id).await.unwrap().unwrap();
        assert_eq!(restored.recipes[0].name, "Saved");

        mirror.delete_backup(&id).await.unwrap();
        assert!(mirror.get_backup(&id).await.unwrap().is_none());
        assert!(mirror.list_backups().await.unwrap().is_empty());
    }
}
