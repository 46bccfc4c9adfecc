//! Directory-based document backend for persistent storage.

use crate::backend::{Collection, DocumentBackend};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

const EXTENSION: &str = "json";

/// Longest id (in bytes) stored under its hex encoding. Longer ids are
/// stored under their SHA-256 digest so every name stays below `NAME_MAX`
/// with room for the temp-file suffix.
const MAX_DIRECT_ID_LEN: usize = 96;

/// Prefix of digest-based names; never produced by hex encoding.
const DIGEST_PREFIX: &str = "h-";

/// A document backend that keeps one JSON file per document.
///
/// Layout: `<root>/<collection>/<name>.json` where `name` is the hex-encoded
/// id, or `h-<sha256(id)>` for ids longer than 96 bytes. Digest-named
/// documents are checked against their stored `_id` on read.
///
/// # Durability
///
/// Writes go to a temporary sibling file which is synced and then renamed
/// over the target, so readers never observe a partially written document.
///
/// # Example
///
/// ```no_run
/// # async fn demo() -> scenesync_storage::StoreResult<()> {
/// use scenesync_storage::{Collection, DirectoryBackend, DocumentBackend};
///
/// let backend = DirectoryBackend::open("scenes-data").await?;
/// backend.put(Collection::Scenes, "room-1", serde_json::json!({"_id": "room-1"})).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DirectoryBackend {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl DirectoryBackend {
    /// Opens a backend rooted at `root`, creating the collection
    /// directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        for collection in [Collection::Scenes, Collection::Files] {
            fs::create_dir_all(root.join(collection.as_str())).await?;
        }
        tracing::debug!(root = %root.display(), "opened directory backend");
        Ok(Self {
            root,
            tmp_counter: AtomicU64::new(0),
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, collection: Collection, id: &str) -> PathBuf {
        self.root
            .join(collection.as_str())
            .join(format!("{}.{EXTENSION}", document_name(id)))
    }

    fn temp_path(&self, target: &Path) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let mut name = target.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.{n}.tmp", std::process::id()));
        target.with_file_name(name)
    }
}

#[async_trait]
impl DocumentBackend for DirectoryBackend {
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Value> {
        let path = self.document_path(collection, id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::not_found(collection, id))
            }
            Err(e) => return Err(e.into()),
        };
        let document: Value = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::malformed(collection, id, e.to_string()))?;

        if id.len() > MAX_DIRECT_ID_LEN {
            if let Some(stored) = document.get("_id").and_then(Value::as_str) {
                if stored != id {
                    tracing::warn!(%collection, "digest name collision, treating as absent");
                    return Err(StoreError::not_found(collection, id));
                }
            }
        }
        Ok(document)
    }

    async fn put(&self, collection: Collection, id: &str, document: Value) -> StoreResult<()> {
        let target = self.document_path(collection, id);
        let temp = self.temp_path(&target);
        let bytes = serde_json::to_vec(&document)?;

        let written = async {
            let mut file = fs::File::create(&temp).await?;
            tokio::io::AsyncWriteExt::write_all(&mut file, &bytes).await?;
            file.sync_all().await?;
            fs::rename(&temp, &target).await
        }
        .await;

        if let Err(e) = written {
            // best effort; the temp file may not exist
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        match fs::remove_file(self.document_path(collection, id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn document_name(id: &str) -> String {
    if id.len() <= MAX_DIRECT_ID_LEN {
        encode_hex(id.as_bytes())
    } else {
        format!("{DIGEST_PREFIX}{}", encode_hex(&Sha256::digest(id.as_bytes())))
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn directory_put_then_get() {
        let dir = tempdir().unwrap();
        let backend = DirectoryBackend::open(dir.path()).await.unwrap();

        backend
            .put(Collection::Scenes, "room-1", json!({"_id": "room-1"}))
            .await
            .unwrap();
        let doc = backend.get(Collection::Scenes, "room-1").await.unwrap();
        assert_eq!(doc["_id"], "room-1");
    }

    #[tokio::test]
    async fn directory_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let backend = DirectoryBackend::open(dir.path()).await.unwrap();
        let err = backend.get(Collection::Files, "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn directory_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let backend = DirectoryBackend::open(dir.path()).await.unwrap();
            backend
                .put(Collection::Files, "f", json!({"files": [1]}))
                .await
                .unwrap();
        }
        let backend = DirectoryBackend::open(dir.path()).await.unwrap();
        assert_eq!(
            backend.get(Collection::Files, "f").await.unwrap(),
            json!({"files": [1]})
        );
    }

    #[tokio::test]
    async fn directory_ids_cannot_escape_root() {
        let dir = tempdir().unwrap();
        let backend = DirectoryBackend::open(dir.path()).await.unwrap();
        backend
            .put(Collection::Scenes, "../../etc/passwd", json!(1))
            .await
            .unwrap();

        let path = backend.document_path(Collection::Scenes, "../../etc/passwd");
        assert!(path.starts_with(dir.path().join("scenes")));
        assert_eq!(
            backend.get(Collection::Scenes, "../../etc/passwd").await.unwrap(),
            json!(1)
        );
    }

    #[tokio::test]
    async fn directory_overwrite_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let backend = DirectoryBackend::open(dir.path()).await.unwrap();
        backend.put(Collection::Scenes, "r", json!({"v": 1})).await.unwrap();
        backend.put(Collection::Scenes, "r", json!({"v": 2})).await.unwrap();

        let entries = std::fs::read_dir(dir.path().join("scenes")).unwrap().count();
        assert_eq!(entries, 1);
        assert_eq!(
            backend.get(Collection::Scenes, "r").await.unwrap(),
            json!({"v": 2})
        );
    }

    #[tokio::test]
    async fn directory_delete_absent_is_ok() {
        let dir = tempdir().unwrap();
        let backend = DirectoryBackend::open(dir.path()).await.unwrap();
        backend.delete(Collection::Scenes, "ghost").await.unwrap();

        backend.put(Collection::Scenes, "r", json!({})).await.unwrap();
        backend.delete(Collection::Scenes, "r").await.unwrap();
        assert!(backend.get(Collection::Scenes, "r").await.unwrap_err().is_not_found());
    }

    #[test]
    fn document_names() {
        assert_eq!(document_name("a/"), "612f");
        assert_eq!(document_name(""), "");

        let long = "r".repeat(200);
        let name = document_name(&long);
        assert!(name.starts_with(DIGEST_PREFIX));
        assert_eq!(name.len(), DIGEST_PREFIX.len() + 64);
        assert_ne!(name, document_name(&"r".repeat(201)));
    }

    #[tokio::test]
    async fn directory_long_ids() {
        let dir = tempdir().unwrap();
        let backend = DirectoryBackend::open(dir.path()).await.unwrap();
        let id = "x".repeat(200);

        let err = backend.get(Collection::Scenes, &id).await.unwrap_err();
        assert!(err.is_not_found());

        backend
            .put(Collection::Files, &id, json!({"_id": id, "files": [1]}))
            .await
            .unwrap();
        let doc = backend.get(Collection::Files, &id).await.unwrap();
        assert_eq!(doc["_id"], id.as_str());

        backend.delete(Collection::Files, &id).await.unwrap();
        assert!(backend.get(Collection::Files, &id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn directory_digest_name_checks_stored_id() {
        let dir = tempdir().unwrap();
        let backend = DirectoryBackend::open(dir.path()).await.unwrap();
        let id = "y".repeat(150);

        let path = backend.document_path(Collection::Scenes, &id);
        std::fs::write(&path, br#"{"_id": "someone-else"}"#).unwrap();
        assert!(backend.get(Collection::Scenes, &id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn directory_corrupt_document_is_malformed() {
        let dir = tempdir().unwrap();
        let backend = DirectoryBackend::open(dir.path()).await.unwrap();
        backend
            .put(Collection::Scenes, "r", json!({"_id": "r", "data": {}}))
            .await
            .unwrap();

        let path = backend.document_path(Collection::Scenes, "r");
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        let err = backend.get(Collection::Scenes, "r").await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { collection: Collection::Scenes, .. }));
    }
}
