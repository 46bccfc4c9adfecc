//! Configuration for the sync engine.

use scenesync_codec::DELETED_ELEMENT_TIMEOUT;
use std::time::Duration;

/// Configuration for scene synchronization.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Recompute the fingerprint after every decrypt and reject records
    /// whose declared `sceneVersion` does not match.
    pub verify_scene_version: bool,
    /// How long deleted elements keep being synced.
    pub deleted_element_timeout: Duration,
}

impl SyncConfig {
    /// Creates a configuration with the defaults.
    pub fn new() -> Self {
        Self {
            verify_scene_version: true,
            deleted_element_timeout: DELETED_ELEMENT_TIMEOUT,
        }
    }

    /// Enables or disables fingerprint verification.
    pub fn with_verify_scene_version(mut self, verify: bool) -> Self {
        self.verify_scene_version = verify;
        self
    }

    /// Sets the deleted element timeout.
    pub fn with_deleted_element_timeout(mut self, timeout: Duration) -> Self {
        self.deleted_element_timeout = timeout;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert!(config.verify_scene_version);
        assert_eq!(config.deleted_element_timeout, Duration::from_secs(86_400));
    }

    #[test]
    fn builder() {
        let config = SyncConfig::new()
            .with_verify_scene_version(false)
            .with_deleted_element_timeout(Duration::from_secs(5));
        assert!(!config.verify_scene_version);
        assert_eq!(config.deleted_element_timeout, Duration::from_secs(5));
    }
}
