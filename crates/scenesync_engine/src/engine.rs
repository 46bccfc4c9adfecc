//! Scene save/load state machine.

use crate::cache::{ConnectionId, VersionCache};
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::reconcile::{AppState, Reconciler, VersionReconciler};
use crate::room::{ActiveRoom, Room};
use parking_lot::{Mutex, RwLock};
use scenesync_codec::{
    decrypt_scene, encrypt_scene, hash_elements_version, now_millis, restore_elements,
    syncable_elements, verify_scene_version, AesGcmCipher, Element, RoomKey, SceneCipher,
    StoredScene,
};
use scenesync_storage::{SceneRecord, SceneStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex as AsyncMutex;

/// Terminal state of a successful save.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Nothing to persist: no active room, or the scene is already synced.
    Skipped,
    /// No record existed; the local scene was written as is.
    Created(Vec<Element>),
    /// The local scene was merged with the stored one and written back.
    Reconciled(Vec<Element>),
}

impl SaveOutcome {
    /// Returns the persisted sequence, if anything was written.
    pub fn elements(&self) -> Option<&[Element]> {
        match self {
            Self::Skipped => None,
            Self::Created(elements) | Self::Reconciled(elements) => Some(elements),
        }
    }

    /// Returns true for [`SaveOutcome::Skipped`].
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Statistics about save and load operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Saves that ended in `Skipped`.
    pub saves_skipped: u64,
    /// Saves that created a record.
    pub scenes_created: u64,
    /// Saves that reconciled with an existing record.
    pub scenes_reconciled: u64,
    /// Saves that failed.
    pub saves_failed: u64,
    /// Loads that returned a scene.
    pub scenes_loaded: u64,
    /// Loads that failed.
    pub loads_failed: u64,
    /// Last successful write.
    pub last_save_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Synchronizes a room's scene with the document store.
///
/// Owns the [`VersionCache`] and serializes saves per room: a save waits for
/// any in-flight save of the same room, then re-checks the cache so a queued
/// duplicate becomes [`SaveOutcome::Skipped`].
pub struct SceneSync<C: SceneCipher = AesGcmCipher, R: Reconciler = VersionReconciler> {
    config: SyncConfig,
    store: SceneStore,
    cipher: Arc<C>,
    reconciler: Arc<R>,
    cache: VersionCache,
    room_locks: RoomLocks,
    stats: RwLock<SyncStats>,
}

impl SceneSync {
    /// Creates an engine with AES-GCM and version-based reconciliation.
    pub fn with_store(store: SceneStore) -> Self {
        Self::new(SyncConfig::default(), store, AesGcmCipher::new(), VersionReconciler)
    }
}

impl<C: SceneCipher, R: Reconciler> SceneSync<C, R> {
    /// Creates a new engine.
    pub fn new(config: SyncConfig, store: SceneStore, cipher: C, reconciler: R) -> Self {
        Self {
            config,
            store,
            cipher: Arc::new(cipher),
            reconciler: Arc::new(reconciler),
            cache: VersionCache::new(),
            room_locks: Mutex::new(HashMap::new()),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the store.
    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    /// Returns the version cache.
    pub fn cache(&self) -> &VersionCache {
        &self.cache
    }

    /// Returns a snapshot of the statistics.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns true if `elements` are known to be persisted on the room's
    /// connection. An inactive room is trivially synced.
    pub fn is_synced(&self, room: &Room, elements: &[Element]) -> bool {
        match room.active() {
            Some(active) => self.is_cached(active.connection, elements),
            None => true,
        }
    }

    /// Forgets the cache entry of a closed connection.
    pub fn connection_closed(&self, connection: &ConnectionId) {
        if self.cache.remove(connection).is_some() {
            tracing::debug!(%connection, "connection closed, cache entry removed");
        }
    }

    /// Persists `elements` for the room.
    ///
    /// On success the Version Cache holds the fingerprint of the returned
    /// sequence. On failure the cache is untouched.
    ///
    /// # Errors
    ///
    /// Store, decode and crypto failures abort the save. Nothing is retried.
    pub async fn save(
        &self,
        room: &Room,
        elements: &[Element],
        app_state: &AppState,
    ) -> SyncResult<SaveOutcome> {
        let Some(active) = room.active() else {
            tracing::debug!("no active room, save skipped");
            self.stats.write().saves_skipped += 1;
            return Ok(SaveOutcome::Skipped);
        };
        if self.is_cached(active.connection, elements) {
            self.stats.write().saves_skipped += 1;
            return Ok(SaveOutcome::Skipped);
        }

        let lease = RoomLease::acquire(&self.room_locks, active.room_id);
        let result = {
            let _guard = lease.lock.lock().await;
            self.save_locked(active, elements, app_state).await
        };
        drop(lease);

        self.record_save(active.room_id, &result);
        result
    }

    /// Loads the room's scene.
    ///
    /// Returns `None` if the room has no record. When `connection` is given,
    /// the Version Cache is updated with the loaded scene.
    ///
    /// # Errors
    ///
    /// A record that exists but cannot be decoded is an error, never `None`.
    pub async fn load(
        &self,
        room_id: &str,
        key: &RoomKey,
        connection: Option<ConnectionId>,
    ) -> SyncResult<Option<Vec<Element>>> {
        let result = self.load_inner(room_id, key, connection).await;

        let mut stats = self.stats.write();
        match &result {
            Ok(Some(elements)) => {
                stats.scenes_loaded += 1;
                tracing::debug!(room_id, elements = elements.len(), "scene loaded");
            }
            Ok(None) => {}
            Err(e) => {
                stats.loads_failed += 1;
                stats.last_error = Some(e.to_string());
                tracing::warn!(room_id, error = %e, "scene load failed");
            }
        }
        result
    }

    async fn load_inner(
        &self,
        room_id: &str,
        key: &RoomKey,
        connection: Option<ConnectionId>,
    ) -> SyncResult<Option<Vec<Element>>> {
        let Some(record) = self.store.get_scene(room_id).await? else {
            return Ok(None);
        };
        let elements = self.open_scene(&record.data, key)?;
        if let Some(connection) = connection {
            self.cache.set(connection, &elements);
        }
        Ok(Some(elements))
    }

    async fn save_locked(
        &self,
        active: ActiveRoom<'_>,
        elements: &[Element],
        app_state: &AppState,
    ) -> SyncResult<SaveOutcome> {
        // an earlier queued save may already have written this scene
        if self.is_cached(active.connection, elements) {
            return Ok(SaveOutcome::Skipped);
        }

        let prior = self.store.get_scene(active.room_id).await?;
        let created = prior.is_none();
        let stored = match prior {
            None => encrypt_scene(&*self.cipher, active.key, elements)?,
            Some(record) => {
                let previous = self.open_scene(&record.data, active.key)?;
                let merged = self.reconciler.reconcile(elements, &previous, app_state);
                let merged = self.syncable(merged);
                encrypt_scene(&*self.cipher, active.key, &merged)?
            }
        };

        let record = SceneRecord::new(active.room_id, stored);
        self.store.put_scene(&record).await?;

        let published = self.open_scene(&record.data, active.key)?;
        self.cache.set(active.connection, &published);

        Ok(if created {
            SaveOutcome::Created(published)
        } else {
            SaveOutcome::Reconciled(published)
        })
    }

    fn open_scene(&self, stored: &StoredScene, key: &RoomKey) -> SyncResult<Vec<Element>> {
        let elements = decrypt_scene(&*self.cipher, stored, key)?;
        if self.config.verify_scene_version {
            verify_scene_version(stored, &elements)?;
        }
        Ok(self.syncable(restore_elements(elements)))
    }

    fn syncable(&self, elements: Vec<Element>) -> Vec<Element> {
        syncable_elements(elements, now_millis(), self.config.deleted_element_timeout)
    }

    fn is_cached(&self, connection: ConnectionId, elements: &[Element]) -> bool {
        self.cache.get(&connection) == Some(hash_elements_version(elements))
    }

    fn record_save(&self, room_id: &str, result: &SyncResult<SaveOutcome>) {
        let mut stats = self.stats.write();
        match result {
            Ok(SaveOutcome::Skipped) => stats.saves_skipped += 1,
            Ok(SaveOutcome::Created(elements)) => {
                stats.scenes_created += 1;
                stats.last_save_time = Some(Instant::now());
                tracing::info!(room_id, elements = elements.len(), "scene created");
            }
            Ok(SaveOutcome::Reconciled(elements)) => {
                stats.scenes_reconciled += 1;
                stats.last_save_time = Some(Instant::now());
                tracing::info!(room_id, elements = elements.len(), "scene reconciled");
            }
            Err(e) => {
                stats.saves_failed += 1;
                stats.last_error = Some(e.to_string());
                tracing::warn!(room_id, error = %e, retryable = e.is_retryable(), "scene save failed");
            }
        }
    }
}

type RoomLocks = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// A handle on a room's save lock.
///
/// The map entry is removed when the last lease is dropped, including when
/// the save future is cancelled while waiting for the lock.
struct RoomLease<'a> {
    locks: &'a RoomLocks,
    room_id: &'a str,
    lock: Arc<AsyncMutex<()>>,
}

impl<'a> RoomLease<'a> {
    fn acquire(locks: &'a RoomLocks, room_id: &'a str) -> Self {
        let lock = locks.lock().entry(room_id.to_string()).or_default().clone();
        Self {
            locks,
            room_id,
            lock,
        }
    }
}

impl Drop for RoomLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock();
        // the map and this lease hold the only references
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(self.room_id);
        }
    }
}

impl<C: SceneCipher, R: Reconciler> std::fmt::Debug for SceneSync<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneSync")
            .field("config", &self.config)
            .field("connections", &self.cache.len())
            .finish_non_exhaustive()
    }
}
