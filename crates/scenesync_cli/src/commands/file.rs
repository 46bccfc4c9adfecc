//! Attachment upload and download commands.

use base64::{engine::general_purpose::STANDARD, Engine};
use scenesync_codec::{now_millis, FileMetadata, RoomKey};
use scenesync_engine::AttachmentTransfer;
use scenesync_storage::{SceneStore, StoreConfig};
use serde::Serialize;
use std::path::Path;

/// Metadata printed for a downloaded file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    /// File id.
    pub id: String,
    /// MIME type.
    pub mime_type: String,
    /// Creation time (epoch ms).
    pub created: u64,
    /// Decoded size in bytes.
    pub size: usize,
}

/// Runs the put-file command.
pub async fn put(
    config: &StoreConfig,
    key: &str,
    id: &str,
    input: &Path,
    mime: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = RoomKey::parse(key)?;
    let bytes = std::fs::read(input)
        .map_err(|e| format!("Failed to read {}: {e}", input.display()))?;
    let transfer = AttachmentTransfer::new(SceneStore::open(config).await?);

    let metadata = FileMetadata {
        mime_type: Some(mime.to_string()),
        created: Some(now_millis()),
    };
    let data_url = encode_data_url(mime, &bytes);
    let upload = transfer.compress_file(&key, id, data_url.as_bytes(), &metadata)?;

    let result = transfer.save_files(vec![upload]).await;
    if !result.errored.is_empty() {
        return Err(format!("Failed to store file {id:?}").into());
    }
    println!("Stored {id} ({} bytes, {mime})", bytes.len());
    Ok(())
}

/// Runs the get-file command.
pub async fn get(
    config: &StoreConfig,
    key: &str,
    id: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = RoomKey::parse(key)?;
    let transfer = AttachmentTransfer::new(SceneStore::open(config).await?);

    let mut result = transfer.load_files(&key, &[id]).await;
    if result.errored.contains(id) {
        return Err(format!("File {id:?} could not be decoded").into());
    }
    let file = result
        .loaded
        .pop()
        .ok_or_else(|| format!("No file stored under {id:?}"))?;

    let (_, bytes) = decode_data_url(&file.data_url)?;
    match output {
        Some(path) => {
            std::fs::write(path, &bytes)?;
            println!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let report = FileReport {
                id: file.id,
                mime_type: file.mime_type,
                created: file.created,
                size: bytes.len(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Splits a base64 data URL into its MIME type and payload.
fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), String> {
    let rest = url
        .strip_prefix("data:")
        .ok_or("not a data URL")?;
    let (header, payload) = rest.split_once(',').ok_or("data URL has no payload")?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or("only base64 data URLs are supported")?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| format!("invalid base64 payload: {e}"))?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn data_url_roundtrip() {
        let url = encode_data_url("image/png", &[0x89, b'P', b'N', b'G']);
        assert!(url.starts_with("data:image/png;base64,"));

        let (mime, bytes) = decode_data_url(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn data_url_rejects_other_forms() {
        assert!(decode_data_url("https://example.com/a.png").is_err());
        assert!(decode_data_url("data:text/plain,hello").is_err());
        assert!(decode_data_url("data:text/plain;base64").is_err());
    }

    #[tokio::test]
    async fn put_then_get_through_directory() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::directory(dir.path().join("store"));
        let input = dir.path().join("in.bin");
        let output = dir.path().join("out.bin");
        std::fs::write(&input, b"\x00\x01binary\xff").unwrap();
        let key = RoomKey::generate().to_encoded();

        put(&config, &key, "f1", &input, "application/octet-stream")
            .await
            .unwrap();
        get(&config, &key, "f1", Some(&output)).await.unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"\x00\x01binary\xff");

        assert!(get(&config, &key, "missing", None).await.is_err());
    }
}
