//! Room keys and the symmetric encryption primitive.
//!
//! Scenes and attachments are encrypted with AES-GCM under the room key
//! before they leave the client. The key is shared out of band in its
//! base64url form and never reaches the store.

use crate::error::{CodecError, CodecResult};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-GCM initialization vector in bytes.
pub const IV_SIZE: usize = 12;
/// Size of a freshly generated room key (AES-128).
pub const ROOM_KEY_SIZE: usize = 16;

/// Symmetric key of a collaboration room.
///
/// Accepts 16-byte (AES-128) and 32-byte (AES-256) keys. The key material is
/// zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RoomKey {
    bytes: Vec<u8>,
}

impl RoomKey {
    /// Generates a new random room key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; ROOM_KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error unless `bytes` is 16 or 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        match bytes.len() {
            16 | 32 => Ok(Self {
                bytes: bytes.to_vec(),
            }),
            other => Err(CodecError::invalid_key(format!(
                "expected 16 or 32 bytes, got {other}"
            ))),
        }
    }

    /// Parses the base64url form used in room links.
    ///
    /// Trailing padding is tolerated.
    pub fn parse(encoded: &str) -> CodecResult<Self> {
        let trimmed = encoded.trim().trim_end_matches('=');
        let mut bytes = URL_SAFE_NO_PAD
            .decode(trimmed)
            .map_err(|e| CodecError::invalid_key(format!("not base64url: {e}")))?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Returns the base64url form of the key.
    ///
    /// # Security
    ///
    /// Don't log the result.
    #[must_use]
    pub fn to_encoded(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.bytes)
    }

    /// Returns the raw key material.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl FromStr for RoomKey {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Debug for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Output of an encryption: ciphertext (with tag) and the IV used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encrypted {
    /// Ciphertext including the authentication tag.
    pub ciphertext: Vec<u8>,
    /// Initialization vector.
    pub iv: Vec<u8>,
}

/// Symmetric encryption primitive used for scenes and attachments.
///
/// Implementations must be deterministic in their decryption: the same
/// `(iv, ciphertext, key)` always yields the same plaintext or the same
/// failure.
pub trait SceneCipher: Send + Sync {
    /// Encrypts `plaintext` under `key` with a fresh IV.
    fn encrypt(&self, key: &RoomKey, plaintext: &[u8]) -> CodecResult<Encrypted>;

    /// Decrypts `ciphertext` produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Crypto`] on a wrong key, a tampered ciphertext
    /// or a malformed IV.
    fn decrypt(&self, iv: &[u8], ciphertext: &[u8], key: &RoomKey) -> CodecResult<Vec<u8>>;
}

/// AES-GCM with a random 96-bit IV per message.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl AesGcmCipher {
    /// Creates the cipher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

enum Gcm {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl Gcm {
    fn for_key(key: &RoomKey) -> CodecResult<Self> {
        let bytes = key.as_bytes();
        let invalid = |_| CodecError::invalid_key(format!("unsupported key size {}", bytes.len()));
        match bytes.len() {
            16 => Aes128Gcm::new_from_slice(bytes).map(Gcm::Aes128).map_err(invalid),
            _ => Aes256Gcm::new_from_slice(bytes).map(Gcm::Aes256).map_err(invalid),
        }
    }
}

impl SceneCipher for AesGcmCipher {
    fn encrypt(&self, key: &RoomKey, plaintext: &[u8]) -> CodecResult<Encrypted> {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);
        let nonce = Nonce::from_slice(&iv);

        let ciphertext = match Gcm::for_key(key)? {
            Gcm::Aes128(cipher) => cipher.encrypt(nonce, plaintext),
            Gcm::Aes256(cipher) => cipher.encrypt(nonce, plaintext),
        }
        .map_err(|_| CodecError::crypto("encryption error"))?;

        Ok(Encrypted {
            ciphertext,
            iv: iv.to_vec(),
        })
    }

    fn decrypt(&self, iv: &[u8], ciphertext: &[u8], key: &RoomKey) -> CodecResult<Vec<u8>> {
        if iv.len() != IV_SIZE {
            return Err(CodecError::crypto(format!(
                "expected {IV_SIZE}-byte iv, got {}",
                iv.len()
            )));
        }
        let nonce = Nonce::from_slice(iv);

        let plaintext = match Gcm::for_key(key)? {
            Gcm::Aes128(cipher) => cipher.decrypt(nonce, ciphertext),
            Gcm::Aes256(cipher) => cipher.decrypt(nonce, ciphertext),
        }
        .map_err(|_| CodecError::crypto("decryption error"))?;

        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_aes128() {
        let cipher = AesGcmCipher::new();
        let key = RoomKey::generate();
        let sealed = cipher.encrypt(&key, b"scene bytes").unwrap();

        assert_eq!(sealed.iv.len(), IV_SIZE);
        assert_ne!(sealed.ciphertext, b"scene bytes");
        let opened = cipher.decrypt(&sealed.iv, &sealed.ciphertext, &key).unwrap();
        assert_eq!(opened, b"scene bytes");
    }

    #[test]
    fn roundtrip_aes256() {
        let cipher = AesGcmCipher::new();
        let key = RoomKey::from_bytes(&[7u8; 32]).unwrap();
        let sealed = cipher.encrypt(&key, b"").unwrap();
        assert!(cipher
            .decrypt(&sealed.iv, &sealed.ciphertext, &key)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn fresh_iv_per_message() {
        let cipher = AesGcmCipher::new();
        let key = RoomKey::generate();
        let a = cipher.encrypt(&key, b"same").unwrap();
        let b = cipher.encrypt(&key, b"same").unwrap();
        assert_ne!(a.iv, b.iv);
    }

    #[test]
    fn wrong_key_fails() {
        let cipher = AesGcmCipher::new();
        let sealed = cipher.encrypt(&RoomKey::generate(), b"secret").unwrap();
        let result = cipher.decrypt(&sealed.iv, &sealed.ciphertext, &RoomKey::generate());
        assert!(matches!(result, Err(CodecError::Crypto { .. })));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let cipher = AesGcmCipher::new();
        let key = RoomKey::generate();
        let mut sealed = cipher.encrypt(&key, b"secret").unwrap();
        sealed.ciphertext[0] ^= 0x01;
        assert!(cipher.decrypt(&sealed.iv, &sealed.ciphertext, &key).is_err());
    }

    #[test]
    fn short_iv_is_crypto_error() {
        let cipher = AesGcmCipher::new();
        let result = cipher.decrypt(&[0u8; 4], &[0u8; 32], &RoomKey::generate());
        assert!(matches!(result, Err(CodecError::Crypto { .. })));
    }

    #[test]
    fn key_sizes() {
        assert!(RoomKey::from_bytes(&[0u8; 16]).is_ok());
        assert!(RoomKey::from_bytes(&[0u8; 32]).is_ok());
        assert!(matches!(
            RoomKey::from_bytes(&[0u8; 24]),
            Err(CodecError::InvalidKey { .. })
        ));
    }

    #[test]
    fn key_encoding_roundtrip() {
        let key = RoomKey::generate();
        let encoded = key.to_encoded();
        assert_eq!(encoded.len(), 22);

        let parsed: RoomKey = encoded.parse().unwrap();
        assert_eq!(parsed.as_bytes(), key.as_bytes());

        let padded = format!("{encoded}==");
        assert_eq!(RoomKey::parse(&padded).unwrap().as_bytes(), key.as_bytes());
    }

    #[test]
    fn key_parse_rejects_garbage() {
        assert!(RoomKey::parse("not a key!").is_err());
        assert!(RoomKey::parse("AAAA").is_err());
    }

    #[test]
    fn key_debug_is_redacted() {
        let key = RoomKey::from_bytes(&[0xAB; 16]).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("171"));
    }
}
