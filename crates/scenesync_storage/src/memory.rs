//! In-memory document backend for testing.

use crate::backend::{Collection, DocumentBackend};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// An in-memory document backend.
///
/// Suitable for unit tests, integration tests and ephemeral rooms that do
/// not need persistence.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across tasks.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    documents: RwLock<HashMap<(Collection, String), Value>>,
    closed: AtomicBool,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw document, bypassing record validation.
    ///
    /// Useful for seeding documents written by other clients.
    pub fn insert_raw(&self, collection: Collection, id: impl Into<String>, document: Value) {
        self.documents.write().insert((collection, id.into()), document);
    }

    /// Returns a copy of a raw document.
    #[must_use]
    pub fn raw(&self, collection: Collection, id: &str) -> Option<Value> {
        self.documents
            .read()
            .get(&(collection, id.to_string()))
            .cloned()
    }

    /// Returns the number of documents in `collection`.
    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }

    /// Returns true if no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Closes the backend. Every later operation fails with
    /// [`StoreError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Value> {
        self.ensure_open()?;
        self.raw(collection, id)
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn put(&self, collection: Collection, id: &str, document: Value) -> StoreResult<()> {
        self.ensure_open()?;
        self.insert_raw(collection, id, document);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.ensure_open()?;
        self.documents.write().remove(&(collection, id.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_new_is_empty() {
        let backend = InMemoryBackend::new();
        assert!(backend.is_empty());
        let err = backend.get(Collection::Scenes, "x").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn memory_put_then_get() {
        let backend = InMemoryBackend::new();
        backend
            .put(Collection::Files, "f1", json!({"files": [1, 2]}))
            .await
            .unwrap();

        let doc = backend.get(Collection::Files, "f1").await.unwrap();
        assert_eq!(doc, json!({"files": [1, 2]}));
        assert_eq!(backend.len(Collection::Files), 1);
        assert_eq!(backend.len(Collection::Scenes), 0);
    }

    #[tokio::test]
    async fn memory_collections_are_separate() {
        let backend = InMemoryBackend::new();
        backend.insert_raw(Collection::Scenes, "same", json!(1));
        backend.insert_raw(Collection::Files, "same", json!(2));
        assert_eq!(backend.get(Collection::Scenes, "same").await.unwrap(), json!(1));
        assert_eq!(backend.get(Collection::Files, "same").await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn memory_put_overwrites() {
        let backend = InMemoryBackend::new();
        backend.put(Collection::Scenes, "r", json!({"a": 1})).await.unwrap();
        backend.put(Collection::Scenes, "r", json!({"b": 2})).await.unwrap();
        assert_eq!(backend.get(Collection::Scenes, "r").await.unwrap(), json!({"b": 2}));
    }

    #[tokio::test]
    async fn memory_delete_is_idempotent() {
        let backend = InMemoryBackend::new();
        backend.insert_raw(Collection::Scenes, "r", json!({}));
        backend.delete(Collection::Scenes, "r").await.unwrap();
        backend.delete(Collection::Scenes, "r").await.unwrap();
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn memory_closed_rejects_operations() {
        let backend = InMemoryBackend::new();
        backend.close();
        assert!(matches!(
            backend.get(Collection::Scenes, "r").await,
            Err(StoreError::Closed)
        ));
        assert!(matches!(
            backend.put(Collection::Scenes, "r", json!({})).await,
            Err(StoreError::Closed)
        ));
    }
}
