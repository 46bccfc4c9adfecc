//! Error types for store operations.

use crate::backend::Collection;
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document exists under the id.
    #[error("document not found: {collection}/{id}")]
    NotFound {
        /// Collection that was queried.
        collection: Collection,
        /// Requested document id.
        id: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A document could not be (de)serialized as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A document exists but does not have the expected record shape.
    #[error("malformed document {collection}/{id}: {message}")]
    Malformed {
        /// Collection of the document.
        collection: Collection,
        /// Document id.
        id: String,
        /// What was wrong with it.
        message: String,
    },

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// The store is closed.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }

    /// Create a malformed-document error.
    pub fn malformed(collection: Collection, id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            collection,
            id: id.into(),
            message: message.into(),
        }
    }

    /// Returns true for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_document() {
        let err = StoreError::not_found(Collection::Scenes, "room-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document not found: scenes/room-1");
    }

    #[test]
    fn io_errors_convert() {
        let err: StoreError = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(!err.is_not_found());
    }
}
