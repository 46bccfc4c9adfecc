//! Attachment payload format.
//!
//! An attachment is stored as a framed buffer list:
//!
//! ```text
//! u32 BE  frame version (1)
//! u32 BE  len | encoding info (JSON)
//! u32 BE  len | iv
//! u32 BE  len | ciphertext
//! ```
//!
//! The ciphertext decrypts to a zlib stream which inflates to another framed
//! list of `[metadata JSON, file bytes]`.

use crate::cipher::{RoomKey, SceneCipher};
use crate::error::{CodecError, CodecResult};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Frame layout version.
pub const FRAME_VERSION: u32 = 1;
/// Encoding info version written into new payloads.
pub const ENCODING_VERSION: u32 = 2;
/// MIME type used when the metadata does not name one.
pub const MIME_BINARY: &str = "application/octet-stream";

const LEN_SIZE: usize = 4;

/// Metadata stored alongside an attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// MIME type of the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Creation time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EncodingInfo {
    version: u32,
    compression: String,
    encryption: String,
}

/// A decrypted, inflated attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFile {
    /// File contents.
    pub data: Vec<u8>,
    /// Metadata recorded at upload.
    pub metadata: FileMetadata,
}

/// Compresses and encrypts `data` for upload.
pub fn compress_file<C>(
    cipher: &C,
    key: &RoomKey,
    data: &[u8],
    metadata: &FileMetadata,
) -> CodecResult<Vec<u8>>
where
    C: SceneCipher + ?Sized,
{
    let metadata_json =
        serde_json::to_vec(metadata).map_err(|e| CodecError::encode(e.to_string()))?;
    let inner = concat_buffers(&[&metadata_json, data])?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&inner)
        .map_err(|e| CodecError::encode(e.to_string()))?;
    let deflated = encoder
        .finish()
        .map_err(|e| CodecError::encode(e.to_string()))?;

    let sealed = cipher.encrypt(key, &deflated)?;
    let info = serde_json::to_vec(&EncodingInfo {
        version: ENCODING_VERSION,
        compression: "zlib".into(),
        encryption: "AES-GCM".into(),
    })
    .map_err(|e| CodecError::encode(e.to_string()))?;

    concat_buffers(&[&info, &sealed.iv, &sealed.ciphertext])
}

/// Decrypts and inflates an attachment produced by [`compress_file`].
///
/// # Errors
///
/// - [`CodecError::InvalidFormat`] for bad framing
/// - [`CodecError::Crypto`] from the cipher
/// - [`CodecError::Decode`] for a corrupt zlib stream or metadata
pub fn decompress_file<C>(cipher: &C, key: &RoomKey, payload: &[u8]) -> CodecResult<DecodedFile>
where
    C: SceneCipher + ?Sized,
{
    let outer = split_buffers(payload)?;
    let [info, iv, ciphertext] = outer.as_slice() else {
        return Err(CodecError::invalid_format(format!(
            "expected 3 outer buffers, got {}",
            outer.len()
        )));
    };
    serde_json::from_slice::<EncodingInfo>(info)
        .map_err(|e| CodecError::decode(format!("encoding info: {e}")))?;

    let deflated = cipher.decrypt(iv, ciphertext, key)?;
    let mut inner = Vec::new();
    ZlibDecoder::new(deflated.as_slice())
        .read_to_end(&mut inner)
        .map_err(|e| CodecError::decode(format!("inflate: {e}")))?;

    let parts = split_buffers(&inner)?;
    let [metadata_json, data] = parts.as_slice() else {
        return Err(CodecError::invalid_format(format!(
            "expected 2 inner buffers, got {}",
            parts.len()
        )));
    };
    // writers may store `null` when there is no metadata
    let metadata = serde_json::from_slice::<Option<FileMetadata>>(metadata_json)
        .map_err(|e| CodecError::decode(format!("metadata: {e}")))?
        .unwrap_or_default();

    Ok(DecodedFile {
        data: data.to_vec(),
        metadata,
    })
}

fn concat_buffers(buffers: &[&[u8]]) -> CodecResult<Vec<u8>> {
    let total: usize = buffers.iter().map(|b| LEN_SIZE + b.len()).sum();
    let mut out = Vec::with_capacity(LEN_SIZE + total);
    out.extend_from_slice(&FRAME_VERSION.to_be_bytes());
    for buffer in buffers {
        let len = u32::try_from(buffer.len())
            .map_err(|_| CodecError::encode("buffer exceeds 4 GiB"))?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(buffer);
    }
    Ok(out)
}

fn split_buffers(bytes: &[u8]) -> CodecResult<Vec<&[u8]>> {
    let (version, mut rest) = read_u32(bytes)
        .ok_or_else(|| CodecError::invalid_format("missing frame version"))?;
    if version != FRAME_VERSION {
        return Err(CodecError::invalid_format(format!(
            "unsupported frame version {version}"
        )));
    }

    let mut buffers = Vec::new();
    while !rest.is_empty() {
        let (len, after_len) =
            read_u32(rest).ok_or_else(|| CodecError::invalid_format("truncated length"))?;
        let len = len as usize;
        if after_len.len() < len {
            return Err(CodecError::invalid_format(format!(
                "buffer of {len} bytes exceeds remaining {}",
                after_len.len()
            )));
        }
        let (buffer, tail) = after_len.split_at(len);
        buffers.push(buffer);
        rest = tail;
    }
    Ok(buffers)
}

fn read_u32(bytes: &[u8]) -> Option<(u32, &[u8])> {
    let (head, tail) = bytes.split_first_chunk::<LEN_SIZE>()?;
    Some((u32::from_be_bytes(*head), tail))
}
