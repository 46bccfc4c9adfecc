//! Fault-injecting document backend.

use async_trait::async_trait;
use parking_lot::RwLock;
use scenesync_storage::{Collection, DocumentBackend, InMemoryBackend, StoreError, StoreResult};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// An in-memory backend that fails chosen operations on demand.
///
/// Optional latency makes every operation yield to the runtime, so
/// concurrent callers actually interleave.
#[derive(Debug, Default)]
pub struct FaultyBackend {
    inner: InMemoryBackend,
    failing_gets: RwLock<HashSet<(Collection, String)>>,
    failing_puts: RwLock<HashSet<(Collection, String)>>,
    latency: Option<Duration>,
    gets: AtomicU64,
    puts: AtomicU64,
}

impl FaultyBackend {
    /// Creates a backend that never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every operation by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes reads of `id` fail with a backend error.
    pub fn fail_get(&self, collection: Collection, id: impl Into<String>) {
        self.failing_gets.write().insert((collection, id.into()));
    }

    /// Makes writes of `id` fail with a backend error.
    pub fn fail_put(&self, collection: Collection, id: impl Into<String>) {
        self.failing_puts.write().insert((collection, id.into()));
    }

    /// Clears all injected failures.
    pub fn heal(&self) {
        self.failing_gets.write().clear();
        self.failing_puts.write().clear();
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &InMemoryBackend {
        &self.inner
    }

    /// Number of `get` calls so far.
    pub fn get_count(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `put` calls so far.
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn injected(
        set: &RwLock<HashSet<(Collection, String)>>,
        collection: Collection,
        id: &str,
    ) -> StoreResult<()> {
        if set.read().contains(&(collection, id.to_string())) {
            return Err(StoreError::Backend(format!(
                "injected failure for {collection}/{id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentBackend for FaultyBackend {
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Value> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        Self::injected(&self.failing_gets, collection, id)?;
        self.inner.get(collection, id).await
    }

    async fn put(&self, collection: Collection, id: &str, document: Value) -> StoreResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        Self::injected(&self.failing_puts, collection, id)?;
        self.inner.put(collection, id, document).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.delay().await;
        self.inner.delete(collection, id).await
    }
}
