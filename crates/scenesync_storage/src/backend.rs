//! Document backend trait definition.

use crate::error::StoreResult;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Collections used by SceneSync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Encrypted scene records keyed by room id.
    Scenes,
    /// Encrypted attachments keyed by content id.
    Files,
}

impl Collection {
    /// Name of the collection as persisted.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scenes => "scenes",
            Self::Files => "files",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key-value document store.
///
/// Backends are **schema-less**: they store and return JSON documents and
/// never interpret record fields. The [`SceneStore`](crate::SceneStore)
/// adapter owns the record shapes.
///
/// # Invariants
///
/// - `get` after a successful `put` returns the document just written
/// - `put` replaces any existing document wholesale
/// - `get` of an absent id fails with [`StoreError::NotFound`](crate::StoreError::NotFound)
/// - `delete` of an absent id succeeds
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::DirectoryBackend`] - One JSON file per document
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Reads the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the document is absent, or a backend failure.
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Value>;

    /// Writes `document` under `id`, replacing any existing one.
    async fn put(&self, collection: Collection, id: &str, document: Value) -> StoreResult<()>;

    /// Removes the document under `id` if present.
    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()>;
}
