//! Scene elements.
//!
//! The drawable schema is owned by the editor; this crate only relies on
//! identity, version and deletion bookkeeping. Every other field is carried
//! through untouched in [`Element::extra`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// How long a deleted element keeps being synced so that peers learn about
/// the deletion.
pub const DELETED_ELEMENT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// A single drawable unit of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Stable identity.
    pub id: String,
    /// Monotonic edit counter, bumped on every change.
    #[serde(default)]
    pub version: u64,
    /// Random tie-breaker for concurrent edits with equal versions.
    #[serde(default)]
    pub version_nonce: u32,
    /// Soft-deletion marker.
    #[serde(default)]
    pub is_deleted: bool,
    /// Last update time in epoch milliseconds.
    #[serde(default)]
    pub updated: u64,
    /// Schema fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    /// Creates a live element with no extra fields.
    pub fn new(id: impl Into<String>, version: u64) -> Self {
        Self {
            id: id.into(),
            version,
            version_nonce: 0,
            is_deleted: false,
            updated: 0,
            extra: Map::new(),
        }
    }

    /// Sets the version nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.version_nonce = nonce;
        self
    }

    /// Sets the update timestamp (epoch milliseconds).
    #[must_use]
    pub fn with_updated(mut self, updated: u64) -> Self {
        self.updated = updated;
        self
    }

    /// Marks the element deleted.
    #[must_use]
    pub fn deleted(mut self) -> Self {
        self.is_deleted = true;
        self
    }

    /// Adds an opaque schema field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Returns true if this element should be persisted and broadcast.
    ///
    /// Deleted elements stay syncable until `timeout` has passed since their
    /// last update.
    pub fn is_syncable(&self, now_ms: u64, timeout: Duration) -> bool {
        if !self.is_deleted {
            return true;
        }
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.updated.saturating_add(timeout_ms) > now_ms
    }
}
