//! Per-connection record of the last persisted scene version.

use parking_lot::RwLock;
use scenesync_codec::{hash_elements_version, Element, SceneVersion};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Identity of a live transport connection.
///
/// Copies compare equal; every [`ConnectionId::new`] is distinct. The engine
/// never looks inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a fresh connection identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing id, e.g. one assigned by the transport.
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Last fingerprint persisted (or loaded) on each connection.
///
/// Entries live until [`remove`](Self::remove) is called for the
/// connection. Concurrent `set`s for one connection are last-write-wins.
#[derive(Debug, Default)]
pub struct VersionCache {
    entries: RwLock<HashMap<ConnectionId, SceneVersion>>,
}

impl VersionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached fingerprint for `connection`.
    pub fn get(&self, connection: &ConnectionId) -> Option<SceneVersion> {
        self.entries.read().get(connection).copied()
    }

    /// Fingerprints `elements` and caches the result for `connection`.
    pub fn set(&self, connection: ConnectionId, elements: &[Element]) -> SceneVersion {
        let version = hash_elements_version(elements);
        self.set_version(connection, version);
        version
    }

    /// Caches a precomputed fingerprint.
    pub fn set_version(&self, connection: ConnectionId, version: SceneVersion) {
        self.entries.write().insert(connection, version);
    }

    /// Forgets `connection`. Call when the connection closes.
    pub fn remove(&self, connection: &ConnectionId) -> Option<SceneVersion> {
        self.entries.write().remove(connection)
    }

    /// Number of tracked connections.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no connection is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
