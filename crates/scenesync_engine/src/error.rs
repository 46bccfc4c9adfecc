//! Error types for the sync engine.

use scenesync_codec::{CodecError, SceneVersion};
use scenesync_storage::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during save and load.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The document store failed (anything but "not found").
    #[error("store error: {0}")]
    Store(StoreError),

    /// A record exists but does not decode into an element sequence.
    #[error("decode error: {message}")]
    Decode {
        /// Error message.
        message: String,
    },

    /// The encryption primitive failed.
    #[error("crypto error: {message}")]
    Crypto {
        /// Error message.
        message: String,
    },

    /// The record's declared fingerprint does not match its contents.
    #[error("scene version mismatch: stored {stored}, computed {computed}")]
    VersionMismatch {
        /// Fingerprint recorded in the store.
        stored: SceneVersion,
        /// Fingerprint of the decrypted elements.
        computed: SceneVersion,
    },

    /// Other codec failure (encoding, key or framing).
    #[error("codec error: {0}")]
    Codec(CodecError),
}

impl SyncError {
    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns true if this error can be retried.
    ///
    /// The engine never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Store(StoreError::Io(_)) | SyncError::Store(StoreError::Backend(_))
        )
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Malformed { .. } => SyncError::decode(err.to_string()),
            other => SyncError::Store(other),
        }
    }
}

impl From<CodecError> for SyncError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Decode { message } => SyncError::Decode { message },
            CodecError::Crypto { message } => SyncError::Crypto { message },
            CodecError::VersionMismatch { stored, computed } => {
                SyncError::VersionMismatch { stored, computed }
            }
            other => SyncError::Codec(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenesync_storage::Collection;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::from(StoreError::Backend("503".into())).is_retryable());
        assert!(!SyncError::from(StoreError::Closed).is_retryable());
        assert!(!SyncError::decode("bad").is_retryable());
        assert!(!SyncError::from(CodecError::crypto("tag")).is_retryable());
    }

    #[test]
    fn malformed_record_is_decode_error() {
        let err = SyncError::from(StoreError::malformed(Collection::Scenes, "r", "no data"));
        assert!(matches!(err, SyncError::Decode { .. }));
    }

    #[test]
    fn codec_errors_map_by_kind() {
        assert!(matches!(
            SyncError::from(CodecError::decode("x")),
            SyncError::Decode { .. }
        ));
        assert!(matches!(
            SyncError::from(CodecError::crypto("x")),
            SyncError::Crypto { .. }
        ));
        assert!(matches!(
            SyncError::from(CodecError::invalid_key("x")),
            SyncError::Codec(CodecError::InvalidKey { .. })
        ));
    }

    #[test]
    fn error_display() {
        let err = SyncError::VersionMismatch {
            stored: SceneVersion(1),
            computed: SceneVersion(2),
        };
        assert!(err.to_string().contains("0000000000000001"));
        assert!(err.to_string().contains("0000000000000002"));
    }
}
