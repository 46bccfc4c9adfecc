//! Test fixtures and store helpers.
//!
//! Provides shorthand for building scenes and for setting up stores that
//! clean up after themselves.

use scenesync_codec::{encrypt_scene, AesGcmCipher, Element, RoomKey};
use scenesync_storage::{SceneRecord, SceneStore, StoreConfig};
use std::path::Path;
use tempfile::TempDir;

/// Shorthand for a live element.
pub fn el(id: &str, version: u64) -> Element {
    Element::new(id, version)
}

/// Builds a scene from `(id, version)` pairs.
pub fn scene(pairs: &[(&str, u64)]) -> Vec<Element> {
    pairs.iter().map(|(id, version)| el(id, *version)).collect()
}

/// Returns the `(id, version)` pairs of a scene, in order.
pub fn id_versions(elements: &[Element]) -> Vec<(String, u64)> {
    elements
        .iter()
        .map(|e| (e.id.clone(), e.version))
        .collect()
}

/// Returns the `(id, version)` pairs of a scene, sorted by id.
pub fn sorted_id_versions(elements: &[Element]) -> Vec<(String, u64)> {
    let mut pairs = id_versions(elements);
    pairs.sort();
    pairs
}

/// A directory-backed store with automatic cleanup.
pub struct TempStore {
    /// The store instance.
    pub store: SceneStore,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TempStore {
    /// Creates a store in a fresh temporary directory.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = SceneStore::open(&StoreConfig::directory(temp_dir.path()))
            .await
            .expect("Failed to open directory store");
        Self {
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the store root.
    pub fn path(&self) -> &Path {
        self._temp_dir.path()
    }
}

impl std::ops::Deref for TempStore {
    type Target = SceneStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Writes `elements` as the record of `room_id`, the way another client
/// would.
pub async fn seed_scene(store: &SceneStore, room_id: &str, key: &RoomKey, elements: &[Element]) {
    let stored =
        encrypt_scene(&AesGcmCipher::new(), key, elements).expect("Failed to encrypt scene");
    store
        .put_scene(&SceneRecord::new(room_id, stored))
        .await
        .expect("Failed to seed scene");
}
