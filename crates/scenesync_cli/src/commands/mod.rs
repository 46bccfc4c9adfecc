//! CLI command implementations.

pub mod file;
pub mod scene;
