//! The sync state machine.
//!
//! One coordinator per session owns the recipe store and serializes every
//! mutation through its methods, so classification of a change as local or
//! remote-origin happens synchronously with the change itself. Inbound
//! snapshots arrive through the mirror subscription; because the mirror
//! echoes this client's own puts back through that feed, echoes are applied
//! as remote-origin and therefore never re-arm the outbound debounce. That
//! invariant is what prevents the push/notify/push loop.

use std::time::Duration;

use chrono::Utc;
use tokio::time::{self, Instant};

use super::{Origin, SyncPhase, SyncStatus};
use crate::models::{Device, Recipe, RecipeUpdate, UserSettings};
use crate::persist::LocalStore;
use crate::remote::{DocKind, RemoteError, RemoteEvent, RemoteMirror, Subscription};
use crate::store::{RecipeStore, StoreError};

#[derive(Debug, Default, Clone, Copy)]
struct Dirty {
    recipes: bool,
    settings: bool,
}

impl Dirty {
    fn mark(&mut self, kind: DocKind) {
        match kind {
            DocKind::Recipes => self.recipes = true,
            DocKind::Settings => self.settings = true,
        }
    }

    fn any(&self) -> bool {
        self.recipes || self.settings
    }
}

/// Governs propagation between the local store and a remote mirror.
pub struct SyncCoordinator<R: RemoteMirror> {
    store: RecipeStore,
    local: LocalStore,
    remote: R,
    phase: SyncPhase,
    status: SyncStatus,
    origin: Origin,
    dirty: Dirty,
    deadline: Option<Instant>,
    debounce: Duration,
    subscription: Option<Subscription>,
    seen_revision: u64,
}

impl<R: RemoteMirror> SyncCoordinator<R> {
    pub fn new(store: RecipeStore, local: LocalStore, remote: R, debounce: Duration) -> Self {
        let seen_revision = store.revision();
        Self {
            store,
            local,
            remote,
            phase: SyncPhase::Uninitialized,
            status: SyncStatus::default(),
            origin: Origin::Local,
            dirty: Dirty::default(),
            deadline: None,
            debounce,
            subscription: None,
            seen_revision,
        }
    }

    pub fn store(&self) -> &RecipeStore {
        &self.store
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    // ------------------------------------------------------------------
    // Bootstrap / lifecycle
    // ------------------------------------------------------------------

    /// Resolves the initial sync direction and opens the live feed.
    ///
    /// A remote with no recipes document yet belongs to a first device:
    /// local state seeds it. Otherwise the remote is the truth and replaces
    /// local state. On failure the store is left untouched and the session
    /// continues in local-only mode.
    pub async fn bootstrap(&mut self) -> Result<(), RemoteError> {
        self.phase = SyncPhase::Bootstrapping;
        match self.bootstrap_inner().await {
            Ok(()) => {
                self.phase = SyncPhase::Active;
                Ok(())
            }
            Err(e) => {
                self.phase = SyncPhase::Suspended;
                Err(e)
            }
        }
    }

    async fn bootstrap_inner(&mut self) -> Result<(), RemoteError> {
        if !self.remote.exists(DocKind::Recipes).await? {
            // First device: seed the remote from local state.
            self.remote.put_recipes(self.store.recipes()).await?;
            self.remote.put_settings(self.store.settings()).await?;
        } else {
            if let Some(doc) = self.remote.get_recipes().await? {
                self.origin = Origin::Remote;
                self.store.replace_all(doc.recipes);
                self.observe(DocKind::Recipes);
            }
            if let Some(doc) = self.remote.get_settings().await? {
                self.origin = Origin::Remote;
                self.store.replace_settings(doc.settings);
                self.observe(DocKind::Settings);
            }
        }
        self.status.last_synced_at = Some(Utc::now());

        // The feed opens after the direction is resolved, so the seed puts
        // above do not echo back into this session.
        self.subscription = Some(self.remote.subscribe().await?);
        Ok(())
    }

    /// Tears down the live side of the session. Safe to call repeatedly or
    /// when never bootstrapped.
    pub fn suspend(&mut self) {
        if let Some(sub) = &self.subscription {
            sub.unsubscribe();
        }
        self.subscription = None;
        self.deadline = None;
        self.dirty = Dirty::default();
        self.status.is_syncing = false;
        self.phase = SyncPhase::Suspended;
    }

    // ------------------------------------------------------------------
    // Local mutations
    // ------------------------------------------------------------------

    pub fn add_recipe(&mut self, recipe: Recipe) -> Result<(), StoreError> {
        self.store.add(recipe)?;
        self.observe(DocKind::Recipes);
        Ok(())
    }

    pub fn update_recipe(&mut self, id: &str, update: &RecipeUpdate) {
        self.store.update(id, update);
        self.observe(DocKind::Recipes);
    }

    pub fn toggle_favorite(&mut self, id: &str) {
        self.store.toggle_favorite(id);
        self.observe(DocKind::Recipes);
    }

    pub fn set_rating(
        &mut self,
        id: &str,
        rating: u8,
        notes: Option<String>,
    ) -> Result<(), StoreError> {
        self.store.set_rating(id, rating, notes)?;
        self.observe(DocKind::Recipes);
        Ok(())
    }

    pub fn assign_slot(&mut self, slot: &str, recipe_id: Option<String>) {
        self.store.assign_slot(slot, recipe_id);
        self.observe(DocKind::Settings);
    }

    pub fn set_device(&mut self, device: Device) {
        self.store.set_device(device);
        self.observe(DocKind::Settings);
    }

    /// Replaces the whole catalog from a restored backup. This is a local
    /// decision, so it propagates outward like any other edit.
    pub fn restore(&mut self, recipes: Vec<Recipe>, settings: UserSettings) {
        self.store.replace_all(recipes);
        self.observe(DocKind::Recipes);
        self.store.replace_settings(settings);
        self.observe(DocKind::Settings);
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    /// Applies a full-document snapshot from the live feed.
    pub fn apply_remote(&mut self, event: RemoteEvent) {
        // The origin flag is set immediately before the store mutation and
        // consumed synchronously by observe(); nothing may suspend between
        // the two, or a concurrent local edit would be misclassified.
        match event {
            RemoteEvent::Recipes(doc) => {
                self.origin = Origin::Remote;
                self.store.replace_all(doc.recipes);
                self.observe(DocKind::Recipes);
            }
            RemoteEvent::Settings(doc) => {
                self.origin = Origin::Remote;
                self.store.replace_settings(doc.settings);
                self.observe(DocKind::Settings);
            }
        }
        self.status.last_synced_at = Some(Utc::now());
    }

    // ------------------------------------------------------------------
    // Change observation and outbound push
    // ------------------------------------------------------------------

    /// Runs after every store mutation attempt: persists the change and,
    /// for local-origin changes while active, (re)arms the debounce.
    fn observe(&mut self, kind: DocKind) {
        if self.store.revision() == self.seen_revision {
            // The mutation was a no-op; nothing to persist or push, and
            // the classification flag keeps its value for the change that
            // actually happens.
            return;
        }
        self.seen_revision = self.store.revision();

        match kind {
            DocKind::Recipes => self.local.save_recipes(self.store.recipes()),
            DocKind::Settings => self.local.save_settings(self.store.settings()),
        }

        if self.origin == Origin::Remote {
            self.origin = Origin::Local;
            return;
        }

        if self.phase == SyncPhase::Active {
            self.dirty.mark(kind);
            self.deadline = Some(Instant::now() + self.debounce);
            self.status.is_syncing = true;
        }
    }

    /// Pushes every dirty document kind now. Failures are logged and the
    /// push is not retried; the next local edit re-arms the debounce.
    async fn flush(&mut self) {
        self.deadline = None;
        let dirty = std::mem::take(&mut self.dirty);
        if !dirty.any() {
            self.status.is_syncing = false;
            return;
        }

        self.status.is_syncing = true;
        let mut synced = false;

        if dirty.recipes {
            match self.remote.put_recipes(self.store.recipes()).await {
                Ok(()) => synced = true,
                Err(e) => tracing::warn!("Failed to push recipes: {}", e),
            }
        }
        if dirty.settings {
            match self.remote.put_settings(self.store.settings()).await {
                Ok(()) => synced = true,
                Err(e) => tracing::warn!("Failed to push settings: {}", e),
            }
        }

        if synced {
            self.status.last_synced_at = Some(Utc::now());
        }
        self.status.is_syncing = false;
    }

    /// Flushes only if the debounce deadline has passed.
    async fn flush_due(&mut self) {
        if matches!(self.deadline, Some(deadline) if deadline <= Instant::now()) {
            self.flush().await;
        }
    }

    /// Forces an immediate push of both documents, regardless of dirty
    /// state. Used by one-shot CLI pushes.
    pub async fn push_now(&mut self) -> Result<(), RemoteError> {
        self.deadline = None;
        self.dirty = Dirty::default();
        self.status.is_syncing = true;
        let result = async {
            self.remote.put_recipes(self.store.recipes()).await?;
            self.remote.put_settings(self.store.settings()).await?;
            Ok(())
        }
        .await;
        self.status.is_syncing = false;
        if result.is_ok() {
            self.status.last_synced_at = Some(Utc::now());
        }
        result
    }

    /// Pulls both documents and applies them as remote-origin. Used by
    /// one-shot CLI pulls.
    pub async fn pull_now(&mut self) -> Result<(), RemoteError> {
        if let Some(doc) = self.remote.get_recipes().await? {
            self.apply_remote(RemoteEvent::Recipes(doc));
        }
        if let Some(doc) = self.remote.get_settings().await? {
            self.apply_remote(RemoteEvent::Settings(doc));
        }
        Ok(())
    }

    /// Applies the next feed snapshot. Returns false once the feed closed.
    async fn apply_next(&mut self) -> bool {
        let event = match &mut self.subscription {
            Some(sub) => sub.next().await,
            None => None,
        };
        match event {
            Some(event) => {
                self.apply_remote(event);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    /// Drives the live session: applies inbound snapshots and fires the
    /// debounced push when its quiet period elapses. Returns when the feed
    /// closes.
    pub async fn run(&mut self) -> Result<(), RemoteError> {
        let mut sub = self
            .subscription
            .take()
            .ok_or_else(|| RemoteError::Feed("not subscribed; bootstrap first".to_string()))?;

        loop {
            let armed = self.deadline.is_some();
            let wake = self
                .deadline
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                event = sub.next() => match event {
                    Some(event) => self.apply_remote(event),
                    None => break,
                },
                _ = time::sleep_until(wake), if armed => self.flush().await,
            }
        }

        self.subscription = Some(sub);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Backup, BackupInfo, FilmSimulation, SensorType};
    use crate::remote::{MemoryMirror, RecipesDoc, SettingsDoc};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn recipe(name: &str) -> Recipe {
        Recipe::new(name, "tester", SensorType::XTransV, FilmSimulation::Provia)
    }

    fn coordinator<R: RemoteMirror>(
        recipes: Vec<Recipe>,
        mirror: R,
        dir: &std::path::Path,
    ) -> SyncCoordinator<R> {
        SyncCoordinator::new(
            RecipeStore::new(recipes, UserSettings::default()),
            LocalStore::new(dir),
            mirror,
            Duration::from_millis(500),
        )
    }

    /// Wraps the in-memory mirror with a switchable outage: while down,
    /// every remote call fails with a connection error.
    #[derive(Clone)]
    struct FlakyMirror {
        inner: MemoryMirror,
        down: Arc<AtomicBool>,
    }

    impl FlakyMirror {
        fn new(inner: MemoryMirror) -> Self {
            Self {
                inner,
                down: Arc::new(AtomicBool::new(false)),
            }
        }

        fn set_down(&self, down: bool) {
            self.down.store(down, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), RemoteError> {
            if self.down.load(Ordering::SeqCst) {
                Err(RemoteError::Connection("server down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl RemoteMirror for FlakyMirror {
        async fn exists(&self, kind: DocKind) -> Result<bool, RemoteError> {
            self.check()?;
            self.inner.exists(kind).await
        }

        async fn get_recipes(&self) -> Result<Option<RecipesDoc>, RemoteError> {
            self.check()?;
            self.inner.get_recipes().await
        }

        async fn get_settings(&self) -> Result<Option<SettingsDoc>, RemoteError> {
            self.check()?;
            self.inner.get_settings().await
        }

        async fn put_recipes(&self, recipes: &[Recipe]) -> Result<(), RemoteError> {
            self.check()?;
            self.inner.put_recipes(recipes).await
        }

        async fn put_settings(&self, settings: &UserSettings) -> Result<(), RemoteError> {
            self.check()?;
            self.inner.put_settings(settings).await
        }

        async fn subscribe(&self) -> Result<Subscription, RemoteError> {
            self.check()?;
            self.inner.subscribe().await
        }

        async fn create_backup(&self, backup: &Backup) -> Result<String, RemoteError> {
            self.check()?;
            self.inner.create_backup(backup).await
        }

        async fn list_backups(&self) -> Result<Vec<BackupInfo>, RemoteError> {
            self.check()?;
            self.inner.list_backups().await
        }

        async fn get_backup(&self, id: &str) -> Result<Option<Backup>, RemoteError> {
            self.check()?;
            self.inner.get_backup(id).await
        }

        async fn delete_backup(&self, id: &str) -> Result<(), RemoteError> {
            self.check()?;
            self.inner.delete_backup(id).await
        }
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_empty_remote() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(
            vec![recipe("A"), recipe("B"), recipe("C")],
            mirror.clone(),
            dir.path(),
        );

        coord.bootstrap().await.unwrap();

        assert_eq!(coord.phase(), SyncPhase::Active);
        assert!(coord.status().last_synced_at.is_some());
        // Exactly one seeding put per document kind.
        assert_eq!(mirror.put_count(DocKind::Recipes), 1);
        assert_eq!(mirror.put_count(DocKind::Settings), 1);
        assert_eq!(mirror.recipes_snapshot().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_bootstrap_adopts_existing_remote() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        mirror.seed_recipes(vec![recipe("Cloud truth")]);
        let mut cloud_settings = UserSettings::default();
        cloud_settings
            .custom_slots
            .insert("C1".to_string(), Some("cloud-id".to_string()));
        mirror.seed_settings(cloud_settings);

        let mut coord = coordinator(vec![recipe("Local draft")], mirror.clone(), dir.path());
        coord.bootstrap().await.unwrap();

        // Subsequent devices adopt the remote's truth, settings included.
        assert_eq!(coord.store().recipes().len(), 1);
        assert_eq!(coord.store().recipes()[0].name, "Cloud truth");
        assert_eq!(
            coord.store().settings().custom_slots.get("C1"),
            Some(&Some("cloud-id".to_string()))
        );
        assert_eq!(mirror.put_count(DocKind::Recipes), 0);
        // And the adopted state is persisted locally.
        let local = LocalStore::new(dir.path());
        assert_eq!(local.load_recipes().unwrap()[0].name, "Cloud truth");
    }

    #[tokio::test]
    async fn test_bootstrap_failure_suspends_and_keeps_local_state() {
        let dir = tempdir().unwrap();
        let mirror = FlakyMirror::new(MemoryMirror::new());
        mirror.set_down(true);
        let mut coord = coordinator(vec![recipe("Survives")], mirror.clone(), dir.path());

        assert!(coord.bootstrap().await.is_err());
        assert_eq!(coord.phase(), SyncPhase::Suspended);
        assert_eq!(coord.store().recipes()[0].name, "Survives");

        // Edits in the suspended session persist locally and arm nothing.
        coord.add_recipe(recipe("Offline too")).unwrap();
        assert!(coord.deadline.is_none());
        assert!(!coord.status().is_syncing);

        // The server comes back and a retried bootstrap seeds both edits.
        mirror.set_down(false);
        coord.bootstrap().await.unwrap();
        assert_eq!(coord.phase(), SyncPhase::Active);
        assert_eq!(mirror.inner.recipes_snapshot().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_failure_clears_pending_without_retry() {
        let dir = tempdir().unwrap();
        let inner = MemoryMirror::new();
        let mirror = FlakyMirror::new(inner.clone());
        let mut coord = coordinator(Vec::new(), mirror.clone(), dir.path());
        coord.bootstrap().await.unwrap();

        coord.add_recipe(recipe("Unlucky")).unwrap();
        mirror.set_down(true);
        time::advance(Duration::from_millis(600)).await;
        coord.flush_due().await;

        // The failed push is dropped, not retried.
        assert!(!coord.status().is_syncing);
        assert!(coord.deadline.is_none());
        assert!(!coord.dirty.any());
        assert_eq!(inner.put_count(DocKind::Recipes), 1); // bootstrap only

        // The next local edit re-arms the debounce and goes through once
        // the server is reachable again.
        mirror.set_down(false);
        let id = coord.store().recipes()[0].id.clone();
        coord.toggle_favorite(&id);
        time::advance(Duration::from_millis(600)).await;
        coord.flush_due().await;
        assert_eq!(inner.put_count(DocKind::Recipes), 2);
        assert!(inner.recipes_snapshot().unwrap()[0].is_favorite);
    }

    #[tokio::test]
    async fn test_suspend_without_bootstrap_keeps_local_state() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(vec![recipe("Keep me")], mirror, dir.path());

        coord.suspend();
        assert_eq!(coord.phase(), SyncPhase::Suspended);
        assert_eq!(coord.store().recipes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_edit_arms_debounce_and_flush_pushes_once() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(Vec::new(), mirror.clone(), dir.path());
        coord.bootstrap().await.unwrap();

        coord.add_recipe(recipe("New")).unwrap();
        assert!(coord.status().is_syncing);
        assert_eq!(mirror.put_count(DocKind::Recipes), 1); // bootstrap only

        time::advance(Duration::from_millis(600)).await;
        coord.flush_due().await;

        assert_eq!(mirror.put_count(DocKind::Recipes), 2);
        assert!(!coord.status().is_syncing);
        assert_eq!(mirror.recipes_snapshot().unwrap()[0].name, "New");
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_rapid_edits() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(Vec::new(), mirror.clone(), dir.path());
        coord.bootstrap().await.unwrap();

        for n in 0..5 {
            coord.add_recipe(recipe(&format!("Edit {}", n))).unwrap();
            time::advance(Duration::from_millis(20)).await;
        }
        // Still within the quiet period: nothing pushed beyond bootstrap.
        assert_eq!(mirror.put_count(DocKind::Recipes), 1);

        time::advance(Duration::from_millis(600)).await;
        coord.flush_due().await;

        // One push carrying the final state, not five.
        assert_eq!(mirror.put_count(DocKind::Recipes), 2);
        assert_eq!(mirror.recipes_snapshot().unwrap().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_own_echo_does_not_repush() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(Vec::new(), mirror.clone(), dir.path());
        coord.bootstrap().await.unwrap();

        coord.add_recipe(recipe("Once")).unwrap();
        time::advance(Duration::from_millis(600)).await;
        coord.flush_due().await;
        assert_eq!(mirror.put_count(DocKind::Recipes), 2);

        // The push echoes back through the feed; applying it must not arm
        // another outbound push.
        assert!(coord.apply_next().await);
        assert!(coord.deadline.is_none());
        assert!(!coord.dirty.any());

        time::advance(Duration::from_millis(600)).await;
        coord.flush_due().await;
        assert_eq!(mirror.put_count(DocKind::Recipes), 2);
        assert_eq!(coord.store().recipes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inbound_apply_is_idempotent() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(Vec::new(), mirror.clone(), dir.path());
        coord.bootstrap().await.unwrap();

        let snapshot = RecipesDoc::new(vec![recipe("From elsewhere")]);
        coord.apply_remote(RemoteEvent::Recipes(snapshot.clone()));
        coord.apply_remote(RemoteEvent::Recipes(snapshot));

        assert_eq!(coord.store().recipes().len(), 1);
        assert!(coord.status().last_synced_at.is_some());
        // No duplicate-triggered outbound push either.
        time::advance(Duration::from_millis(600)).await;
        coord.flush_due().await;
        assert_eq!(mirror.put_count(DocKind::Recipes), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_edit_after_inbound_apply_still_pushes() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(Vec::new(), mirror.clone(), dir.path());
        coord.bootstrap().await.unwrap();

        coord.apply_remote(RemoteEvent::Recipes(RecipesDoc::new(vec![
            recipe("Synced"),
        ])));

        // The one-shot classification was consumed by the apply; the next
        // local edit is local again.
        let id = coord.store().recipes()[0].id.clone();
        coord.toggle_favorite(&id);
        assert!(coord.deadline.is_some());

        time::advance(Duration::from_millis(600)).await;
        coord.flush_due().await;
        assert_eq!(mirror.put_count(DocKind::Recipes), 2);
    }

    #[tokio::test]
    async fn test_settings_mutations_push_settings_doc() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(Vec::new(), mirror.clone(), dir.path());
        coord.bootstrap().await.unwrap();

        coord.assign_slot("C1", Some("some-recipe".to_string()));
        coord.flush().await;

        assert_eq!(mirror.put_count(DocKind::Settings), 2); // bootstrap + push
        assert_eq!(mirror.put_count(DocKind::Recipes), 1); // bootstrap only
    }

    #[tokio::test]
    async fn test_suspend_clears_pending_work_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(Vec::new(), mirror.clone(), dir.path());
        coord.bootstrap().await.unwrap();

        coord.add_recipe(recipe("Pending")).unwrap();
        assert!(coord.deadline.is_some());

        coord.suspend();
        coord.suspend();

        assert_eq!(coord.phase(), SyncPhase::Suspended);
        assert!(coord.deadline.is_none());
        assert!(!coord.status().is_syncing);

        // Re-authentication runs bootstrap again; the remote doc now
        // exists, so this device adopts it.
        coord.bootstrap().await.unwrap();
        assert_eq!(coord.phase(), SyncPhase::Active);
    }

    #[tokio::test]
    async fn test_mutation_while_suspended_stays_local() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(Vec::new(), mirror.clone(), dir.path());

        // Never bootstrapped: edits persist locally but arm nothing.
        coord.add_recipe(recipe("Offline")).unwrap();
        assert!(coord.deadline.is_none());
        assert!(!coord.status().is_syncing);

        let local = LocalStore::new(dir.path());
        assert_eq!(local.load_recipes().unwrap()[0].name, "Offline");
    }

    #[tokio::test]
    async fn test_push_and_pull_now() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(vec![recipe("Mine")], mirror.clone(), dir.path());

        coord.push_now().await.unwrap();
        assert_eq!(mirror.recipes_snapshot().unwrap()[0].name, "Mine");

        mirror.seed_recipes(vec![recipe("Theirs")]);
        coord.pull_now().await.unwrap();
        assert_eq!(coord.store().recipes()[0].name, "Theirs");
        // The pull applied as remote-origin: nothing armed.
        assert!(coord.deadline.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_applies_cross_device_writes() {
        let dir = tempdir().unwrap();
        let mirror = MemoryMirror::new();
        let mut coord = coordinator(Vec::new(), mirror.clone(), dir.path());
        coord.bootstrap().await.unwrap();

        // Another device writes while our run loop is live.
        mirror.emit(RemoteEvent::Recipes(RecipesDoc::new(vec![recipe(
            "From the other device",
        )])));

        // Run until the feed is unsubscribed out from under the loop.
        let applied = tokio::select! {
            _ = coord.run() => false,
            _ = time::sleep(Duration::from_millis(50)) => true,
        };
        assert!(applied);
        assert_eq!(coord.store().recipes().len(), 1);
        assert_eq!(coord.store().recipes()[0].name, "From the other device");
    }
}
