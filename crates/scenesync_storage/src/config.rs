//! Store configuration.

use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable naming the directory store root.
pub const STORE_DIR_ENV: &str = "SCENESYNC_STORE_DIR";

/// Which backend the store uses. Chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// Ephemeral in-memory documents.
    Memory,
    /// One JSON file per document under `root`.
    Directory {
        /// Store root directory.
        root: PathBuf,
    },
}

/// Configuration for [`SceneStore::open`](crate::SceneStore::open).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backend selection.
    pub backend: BackendKind,
}

impl StoreConfig {
    /// Creates a configuration for `backend`.
    pub fn new(backend: BackendKind) -> Self {
        Self { backend }
    }

    /// In-memory store.
    pub fn memory() -> Self {
        Self::new(BackendKind::Memory)
    }

    /// Directory store rooted at `root`.
    pub fn directory(root: impl Into<PathBuf>) -> Self {
        Self::new(BackendKind::Directory { root: root.into() })
    }

    /// Reads the configuration from the environment.
    ///
    /// Uses the directory backend when `SCENESYNC_STORE_DIR` is set and
    /// non-empty, the memory backend otherwise.
    pub fn from_env() -> Self {
        Self::from_store_dir(std::env::var_os(STORE_DIR_ENV))
    }

    fn from_store_dir(dir: Option<OsString>) -> Self {
        match dir {
            Some(root) if !root.is_empty() => Self::directory(root),
            _ => Self::memory(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::memory()
    }
}
