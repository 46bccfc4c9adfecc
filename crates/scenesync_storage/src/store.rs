//! The scene store adapter.

use crate::backend::{Collection, DocumentBackend};
use crate::config::{BackendKind, StoreConfig};
use crate::directory::DirectoryBackend;
use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryBackend;
use crate::record::{SceneRecord, StoredFile};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Typed access to scene records and stored files over a [`DocumentBackend`].
///
/// - an absent document reads as `None`, never as an error
/// - binary fields are normalized on read
/// - a document without the record shape is [`StoreError::Malformed`]
///
/// Cloning is cheap; clones share the backend.
#[derive(Clone)]
pub struct SceneStore {
    backend: Arc<dyn DocumentBackend>,
}

impl SceneStore {
    /// Wraps an existing backend.
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    /// Creates a store over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()))
    }

    /// Opens the backend selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory backend cannot be created.
    pub async fn open(config: &StoreConfig) -> StoreResult<Self> {
        let backend: Arc<dyn DocumentBackend> = match &config.backend {
            BackendKind::Memory => Arc::new(InMemoryBackend::new()),
            BackendKind::Directory { root } => Arc::new(DirectoryBackend::open(root).await?),
        };
        Ok(Self::new(backend))
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &Arc<dyn DocumentBackend> {
        &self.backend
    }

    /// Reads the scene record of `room_id`.
    pub async fn get_scene(&self, room_id: &str) -> StoreResult<Option<SceneRecord>> {
        self.get_record(Collection::Scenes, room_id).await
    }

    /// Overwrites the scene record of its room.
    pub async fn put_scene(&self, record: &SceneRecord) -> StoreResult<()> {
        self.put_record(Collection::Scenes, &record.id, record).await
    }

    /// Removes the scene record of `room_id`, if any.
    pub async fn delete_scene(&self, room_id: &str) -> StoreResult<()> {
        self.backend.delete(Collection::Scenes, room_id).await
    }

    /// Reads the stored file `id`.
    pub async fn get_file(&self, id: &str) -> StoreResult<Option<StoredFile>> {
        self.get_record(Collection::Files, id).await
    }

    /// Overwrites the stored file under its id.
    pub async fn put_file(&self, file: &StoredFile) -> StoreResult<()> {
        self.put_record(Collection::Files, &file.id, file).await
    }

    /// Removes the stored file `id`, if any.
    pub async fn delete_file(&self, id: &str) -> StoreResult<()> {
        self.backend.delete(Collection::Files, id).await
    }

    async fn get_record<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> StoreResult<Option<T>> {
        let document = match self.backend.get(collection, id).await {
            Ok(document) => document,
            Err(e) if e.is_not_found() => {
                tracing::debug!(%collection, id, "document not found");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        serde_json::from_value(document)
            .map(Some)
            .map_err(|e| StoreError::malformed(collection, id, e.to_string()))
    }

    async fn put_record<T: Serialize>(
        &self,
        collection: Collection,
        id: &str,
        record: &T,
    ) -> StoreResult<()> {
        let document = serde_json::to_value(record)?;
        self.backend.put(collection, id, document).await?;
        tracing::debug!(%collection, id, "document written");
        Ok(())
    }
}

impl std::fmt::Debug for SceneStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneStore").finish_non_exhaustive()
    }
}
