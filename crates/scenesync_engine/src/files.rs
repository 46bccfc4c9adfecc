//! Attachment upload and download.

use crate::error::{SyncError, SyncResult};
use futures::future::join_all;
use scenesync_codec::{
    compress_file, decompress_file, now_millis, AesGcmCipher, FileMetadata, RoomKey, SceneCipher,
    MIME_BINARY,
};
use scenesync_storage::{SceneStore, StoredFile};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// An encoded attachment ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Content id.
    pub id: String,
    /// Payload as produced by [`AttachmentTransfer::compress_file`].
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Creates an upload item.
    pub fn new(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            bytes,
        }
    }
}

/// Result of [`AttachmentTransfer::save_files`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedFiles {
    /// Ids written successfully.
    pub saved: BTreeSet<String>,
    /// Ids whose write failed.
    pub errored: BTreeSet<String>,
}

/// A downloaded, decoded attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    /// Content id.
    pub id: String,
    /// MIME type, `application/octet-stream` if unknown.
    pub mime_type: String,
    /// The file as a data URL.
    pub data_url: String,
    /// Creation time (epoch ms), now if unknown.
    pub created: u64,
    /// Retrieval time (epoch ms).
    pub last_retrieved: u64,
}

/// Result of [`AttachmentTransfer::load_files`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedFiles {
    /// Decoded files, in request order.
    pub loaded: Vec<LoadedFile>,
    /// Ids that were found but failed to fetch or decode.
    pub errored: BTreeSet<String>,
}

enum Fetched {
    Loaded(LoadedFile),
    Missing,
    Errored(String),
}

/// Moves encrypted attachments in and out of the store.
///
/// Items are processed concurrently and independently: one item's failure
/// never aborts the batch.
pub struct AttachmentTransfer<C: SceneCipher = AesGcmCipher> {
    store: SceneStore,
    cipher: Arc<C>,
}

impl AttachmentTransfer {
    /// Creates a transfer using AES-GCM.
    pub fn new(store: SceneStore) -> Self {
        Self::with_cipher(store, AesGcmCipher::new())
    }
}

impl<C: SceneCipher> AttachmentTransfer<C> {
    /// Creates a transfer with a custom cipher.
    pub fn with_cipher(store: SceneStore, cipher: C) -> Self {
        Self {
            store,
            cipher: Arc::new(cipher),
        }
    }

    /// Encodes `data` (a data URL) for upload under `id`.
    pub fn compress_file(
        &self,
        key: &RoomKey,
        id: impl Into<String>,
        data: &[u8],
        metadata: &FileMetadata,
    ) -> SyncResult<FileUpload> {
        let bytes = compress_file(&*self.cipher, key, data, metadata)?;
        Ok(FileUpload::new(id, bytes))
    }

    /// Writes every file. Never fails as a whole.
    pub async fn save_files(&self, files: Vec<FileUpload>) -> SavedFiles {
        let writes = files.into_iter().map(|file| async move {
            let stored = StoredFile::new(file.id, file.bytes);
            let result = self.store.put_file(&stored).await;
            (stored.id, result)
        });

        let mut outcome = SavedFiles::default();
        for (id, result) in join_all(writes).await {
            match result {
                Ok(()) => {
                    outcome.saved.insert(id);
                }
                Err(e) => {
                    tracing::warn!(file_id = %id, error = %e, "file save failed");
                    outcome.errored.insert(id);
                }
            }
        }
        tracing::debug!(
            saved = outcome.saved.len(),
            errored = outcome.errored.len(),
            "files saved"
        );
        outcome
    }

    /// Fetches and decodes the files `ids`. Never fails as a whole.
    ///
    /// Duplicate ids are fetched once. Missing files are skipped; files that
    /// exist but cannot be fetched or decoded are reported in `errored`.
    pub async fn load_files<S: AsRef<str>>(&self, key: &RoomKey, ids: &[S]) -> LoadedFiles {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<&str> = ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| seen.insert(*id))
            .collect();

        let fetches = unique.into_iter().map(|id| self.fetch_file(key, id));

        let mut outcome = LoadedFiles::default();
        for fetched in join_all(fetches).await {
            match fetched {
                Fetched::Loaded(file) => outcome.loaded.push(file),
                Fetched::Missing => {}
                Fetched::Errored(id) => {
                    outcome.errored.insert(id);
                }
            }
        }
        outcome
    }

    async fn fetch_file(&self, key: &RoomKey, id: &str) -> Fetched {
        let stored = match self.store.get_file(id).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return Fetched::Missing,
            Err(e) => {
                tracing::warn!(file_id = id, error = %e, "file fetch failed");
                return Fetched::Errored(id.to_string());
            }
        };

        match self.decode_file(key, stored) {
            Ok(file) => Fetched::Loaded(file),
            Err(e) => {
                tracing::warn!(file_id = id, error = %e, "file decode failed");
                Fetched::Errored(id.to_string())
            }
        }
    }

    fn decode_file(&self, key: &RoomKey, stored: StoredFile) -> SyncResult<LoadedFile> {
        let decoded = decompress_file(&*self.cipher, key, &stored.bytes)?;
        let data_url = String::from_utf8(decoded.data)
            .map_err(|e| SyncError::decode(format!("data url is not UTF-8: {e}")))?;
        let created = decoded.metadata.created.unwrap_or_else(now_millis);

        Ok(LoadedFile {
            id: stored.id,
            mime_type: decoded
                .metadata
                .mime_type
                .unwrap_or_else(|| MIME_BINARY.to_string()),
            data_url,
            created,
            last_retrieved: created,
        })
    }
}
