//! Encrypted scene codec.

use crate::cipher::{RoomKey, SceneCipher};
use crate::element::Element;
use crate::error::{CodecError, CodecResult};
use crate::fingerprint::{hash_elements_version, SceneVersion};
use crate::marshal::serde_bytes;
use serde::{Deserialize, Serialize};

/// Persisted form of a scene.
///
/// `ciphertext` decrypts under the room key and `iv` to the JSON encoding of
/// an element sequence whose fingerprint is `scene_version`. The binding is
/// advisory; see [`verify_scene_version`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredScene {
    /// Fingerprint of the encrypted elements.
    pub scene_version: SceneVersion,
    /// Initialization vector.
    #[serde(with = "serde_bytes")]
    pub iv: Vec<u8>,
    /// Encrypted JSON element sequence.
    #[serde(with = "serde_bytes")]
    pub ciphertext: Vec<u8>,
}

/// Encrypts `elements` into a [`StoredScene`].
pub fn encrypt_scene<C>(cipher: &C, key: &RoomKey, elements: &[Element]) -> CodecResult<StoredScene>
where
    C: SceneCipher + ?Sized,
{
    let scene_version = hash_elements_version(elements);
    let json = serde_json::to_vec(elements).map_err(|e| CodecError::encode(e.to_string()))?;
    let sealed = cipher.encrypt(key, &json)?;

    Ok(StoredScene {
        scene_version,
        iv: sealed.iv,
        ciphertext: sealed.ciphertext,
    })
}

/// Decrypts a [`StoredScene`] back into its element sequence.
///
/// # Errors
///
/// - [`CodecError::Crypto`] from the cipher, unchanged
/// - [`CodecError::Decode`] if the plaintext is not a JSON element array
pub fn decrypt_scene<C>(cipher: &C, stored: &StoredScene, key: &RoomKey) -> CodecResult<Vec<Element>>
where
    C: SceneCipher + ?Sized,
{
    let plaintext = cipher.decrypt(&stored.iv, &stored.ciphertext, key)?;
    serde_json::from_slice(&plaintext).map_err(|e| CodecError::decode(e.to_string()))
}

/// Checks that `elements` (as decrypted from `stored`) match the recorded
/// fingerprint.
pub fn verify_scene_version(stored: &StoredScene, elements: &[Element]) -> CodecResult<()> {
    let computed = hash_elements_version(elements);
    if computed != stored.scene_version {
        return Err(CodecError::VersionMismatch {
            stored: stored.scene_version,
            computed,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::AesGcmCipher;
    use serde_json::json;

    fn scene() -> Vec<Element> {
        vec![
            Element::new("a", 1),
            Element::new("b", 3).with_field("type", json!("ellipse")),
        ]
    }

    #[test]
    fn roundtrip_preserves_order_and_fields() {
        let cipher = AesGcmCipher::new();
        let key = RoomKey::generate();
        let stored = encrypt_scene(&cipher, &key, &scene()).unwrap();

        assert_eq!(stored.scene_version, hash_elements_version(&scene()));
        let decoded = decrypt_scene(&cipher, &stored, &key).unwrap();
        assert_eq!(decoded, scene());
        verify_scene_version(&stored, &decoded).unwrap();
    }

    #[test]
    fn non_json_plaintext_is_decode_error() {
        let cipher = AesGcmCipher::new();
        let key = RoomKey::generate();
        let sealed = cipher.encrypt(&key, b"{ definitely not elements").unwrap();
        let stored = StoredScene {
            scene_version: SceneVersion(0),
            iv: sealed.iv,
            ciphertext: sealed.ciphertext,
        };

        let result = decrypt_scene(&cipher, &stored, &key);
        assert!(matches!(result, Err(CodecError::Decode { .. })));
    }

    #[test]
    fn wrong_shape_is_decode_error() {
        let cipher = AesGcmCipher::new();
        let key = RoomKey::generate();
        let sealed = cipher.encrypt(&key, br#"{"id": "a"}"#).unwrap();
        let stored = StoredScene {
            scene_version: SceneVersion(0),
            iv: sealed.iv,
            ciphertext: sealed.ciphertext,
        };
        assert!(matches!(
            decrypt_scene(&cipher, &stored, &key),
            Err(CodecError::Decode { .. })
        ));
    }

    #[test]
    fn crypto_failure_is_propagated() {
        let cipher = AesGcmCipher::new();
        let stored = encrypt_scene(&cipher, &RoomKey::generate(), &scene()).unwrap();
        let result = decrypt_scene(&cipher, &stored, &RoomKey::generate());
        assert!(matches!(result, Err(CodecError::Crypto { .. })));
    }

    #[test]
    fn forged_version_is_detected() {
        let cipher = AesGcmCipher::new();
        let key = RoomKey::generate();
        let mut stored = encrypt_scene(&cipher, &key, &scene()).unwrap();
        stored.scene_version = SceneVersion(stored.scene_version.0.wrapping_add(1));

        let decoded = decrypt_scene(&cipher, &stored, &key).unwrap();
        assert!(matches!(
            verify_scene_version(&stored, &decoded),
            Err(CodecError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn stored_scene_accepts_index_keyed_bytes() {
        let raw = json!({
            "sceneVersion": 5,
            "iv": {"1": 2, "0": 1},
            "ciphertext": [3, 4, 5]
        });
        let stored: StoredScene = serde_json::from_value(raw).unwrap();
        assert_eq!(stored.iv, vec![1, 2]);
        assert_eq!(stored.ciphertext, vec![3, 4, 5]);
        assert_eq!(stored.scene_version, SceneVersion(5));
    }
}
