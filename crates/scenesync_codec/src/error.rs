//! Error types for the codec crate.

use crate::fingerprint::SceneVersion;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding, encrypting or decoding scene data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Plaintext did not decode into a well-formed element sequence.
    #[error("decoding failed: {message}")]
    Decode {
        /// Description of the decoding error.
        message: String,
    },

    /// Failed to serialize a value.
    #[error("encoding failed: {message}")]
    Encode {
        /// Description of the encoding error.
        message: String,
    },

    /// The encryption primitive rejected the input (wrong key, tampered data).
    #[error("crypto failure: {message}")]
    Crypto {
        /// Description of the crypto error.
        message: String,
    },

    /// Room key has the wrong size or encoding.
    #[error("invalid room key: {message}")]
    InvalidKey {
        /// Description of the key problem.
        message: String,
    },

    /// A persisted binary field could not be normalized into bytes.
    #[error("malformed binary field: {message}")]
    Marshal {
        /// Description of the marshaling error.
        message: String,
    },

    /// Attachment payload framing is invalid.
    #[error("invalid file format: {message}")]
    InvalidFormat {
        /// Description of the framing error.
        message: String,
    },

    /// Decrypted elements do not match the stored fingerprint.
    #[error("scene version mismatch: stored {stored}, computed {computed}")]
    VersionMismatch {
        /// Fingerprint recorded alongside the ciphertext.
        stored: SceneVersion,
        /// Fingerprint of the decrypted elements.
        computed: SceneVersion,
    },
}

impl CodecError {
    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create a crypto error.
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Create a marshaling error.
    pub fn marshal(message: impl Into<String>) -> Self {
        Self::Marshal {
            message: message.into(),
        }
    }

    /// Create an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}
