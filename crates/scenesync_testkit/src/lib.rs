//! # SceneSync Testkit
//!
//! Test utilities for SceneSync.
//!
//! This crate provides:
//! - Scene shorthand and temporary directory stores
//! - A fault-injecting document backend
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scenesync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn test_with_failing_store() {
//!     let backend = Arc::new(FaultyBackend::new());
//!     backend.fail_put(Collection::Files, "f2");
//!     // ... test operations
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faulty::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use faulty::*;
pub use fixtures::*;
pub use generators::*;
