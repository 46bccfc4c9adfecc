//! # SceneSync Storage
//!
//! Document backends and the scene store adapter for SceneSync.
//!
//! Backends are **schema-less document stores**: they keep JSON documents in
//! two collections (`scenes`, `files`) and know nothing about encryption or
//! element formats. The [`SceneStore`] adapter maps documents to typed
//! records.
//!
//! ## Design Principles
//!
//! - Absent documents are `None` at the adapter, `NotFound` at the backend
//! - Writes replace documents wholesale
//! - The backend is chosen once, through [`StoreConfig`]
//! - Backends must be `Send + Sync` and are shared behind an `Arc`
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral rooms
//! - [`DirectoryBackend`] - One JSON file per document
//!
//! ## Example
//!
//! ```rust
//! # tokio_test_block(async {
//! use scenesync_storage::{SceneStore, StoreConfig, StoredFile};
//!
//! let store = SceneStore::open(&StoreConfig::memory()).await.unwrap();
//! store.put_file(&StoredFile::new("f1", vec![1, 2, 3])).await.unwrap();
//! assert_eq!(store.get_file("f1").await.unwrap().unwrap().bytes, vec![1, 2, 3]);
//! assert!(store.get_scene("missing").await.unwrap().is_none());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod directory;
mod error;
mod memory;
mod record;
mod store;

pub use backend::{Collection, DocumentBackend};
pub use config::{BackendKind, StoreConfig, STORE_DIR_ENV};
pub use directory::DirectoryBackend;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryBackend;
pub use record::{SceneRecord, StoredFile};
pub use store::SceneStore;
