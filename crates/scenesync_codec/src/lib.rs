//! # SceneSync Codec
//!
//! Scene model and encrypted codecs for SceneSync.
//!
//! This crate provides:
//! - [`Element`] and the syncable/restore normalization rules
//! - [`hash_elements_version`], the scene fingerprint used for staleness checks
//! - [`RoomKey`] and the [`SceneCipher`] encryption seam (AES-GCM by default)
//! - [`encrypt_scene`] / [`decrypt_scene`] for [`StoredScene`] records
//! - the attachment payload format ([`compress_file`] / [`decompress_file`])
//! - [`marshal::dense_bytes`], normalization of persisted binary fields
//!
//! This is a pure crate with no I/O.
//!
//! ## Usage
//!
//! ```
//! use scenesync_codec::{decrypt_scene, encrypt_scene, AesGcmCipher, Element, RoomKey};
//!
//! let cipher = AesGcmCipher::new();
//! let key = RoomKey::generate();
//! let elements = vec![Element::new("a", 1)];
//!
//! let stored = encrypt_scene(&cipher, &key, &elements).unwrap();
//! let decoded = decrypt_scene(&cipher, &stored, &key).unwrap();
//! assert_eq!(decoded, elements);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cipher;
mod element;
mod error;
mod file;
mod fingerprint;
pub mod marshal;
mod restore;
mod scene;

pub use cipher::{AesGcmCipher, Encrypted, RoomKey, SceneCipher, IV_SIZE, ROOM_KEY_SIZE};
pub use element::{Element, DELETED_ELEMENT_TIMEOUT};
pub use error::{CodecError, CodecResult};
pub use file::{
    compress_file, decompress_file, DecodedFile, FileMetadata, ENCODING_VERSION, FRAME_VERSION,
    MIME_BINARY,
};
pub use fingerprint::{hash_elements_version, SceneVersion};
pub use restore::{now_millis, restore_elements, syncable_elements};
pub use scene::{decrypt_scene, encrypt_scene, verify_scene_version, StoredScene};
