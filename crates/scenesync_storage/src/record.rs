//! Persisted record shapes.

use scenesync_codec::marshal::serde_bytes;
use scenesync_codec::StoredScene;
use serde::{Deserialize, Serialize};

/// The stored scene of a room. Overwritten in full on each save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRecord {
    /// Room id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Encrypted scene.
    pub data: StoredScene,
}

impl SceneRecord {
    /// Creates a record for `room_id`.
    pub fn new(room_id: impl Into<String>, data: StoredScene) -> Self {
        Self {
            id: room_id.into(),
            data,
        }
    }
}

/// An encrypted attachment payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Content id of the attachment.
    #[serde(rename = "_id")]
    pub id: String,
    /// Framed, encrypted payload.
    #[serde(rename = "files", with = "serde_bytes")]
    pub bytes: Vec<u8>,
}

impl StoredFile {
    /// Creates a stored file.
    pub fn new(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            bytes,
        }
    }
}
