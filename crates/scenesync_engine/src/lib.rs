//! # SceneSync Engine
//!
//! Scene synchronization engine for SceneSync.
//!
//! This crate provides:
//! - Save state machine (check → fetch → create or reconcile → publish)
//! - Per-connection version cache with an explicit close hook
//! - Pluggable reconciliation of concurrent edits
//! - Concurrent attachment upload and download with per-item errors
//!
//! ## Architecture
//!
//! A save runs strictly in sequence:
//! 1. Skip if there is no active room or the scene is already persisted
//! 2. Fetch the room's current record
//! 3. Write the local scene (no record), or merge it with the stored one
//! 4. Decrypt what was written and cache its fingerprint
//!
//! ## Key Invariants
//!
//! - Saves for one room never overlap
//! - A failed save leaves the version cache untouched
//! - A missing record is `None`; a corrupt one is an error
//! - Nothing is retried internally

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod engine;
mod error;
mod files;
mod reconcile;
mod room;

pub use cache::{ConnectionId, VersionCache};
pub use config::SyncConfig;
pub use engine::{SaveOutcome, SceneSync, SyncStats};
pub use error::{SyncError, SyncResult};
pub use files::{AttachmentTransfer, FileUpload, LoadedFile, LoadedFiles, SavedFiles};
pub use reconcile::{AppState, Reconciler, VersionReconciler};
pub use room::{ActiveRoom, Room};
