//! Relational Decompressor
//!
//! Each blob is an LZ-String `compressToUTF16` payload wrapping a JSON array of
//! records. A present blob either decodes completely or rejects the snapshot.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{BlobName, BlobSet, SyncError, SyncResult, SyncData};

/// Decompress one UTF-16 payload back to text.
///
/// `compressToUTF16` output never contains code units below 0x20; such a unit
/// means the payload is corrupt and would underflow inside the decoder.
pub fn decompress(payload: &str) -> Option<String> {
    if payload.encode_utf16().any(|u| u < 32) {
        return None;
    }
    let wide = lz_str::decompress_from_utf16(payload)?;
    String::from_utf16(&wide).ok()
}

pub fn compress(text: &str) -> String {
    lz_str::compress_to_utf16(text)
}

fn decode_blob<T: DeserializeOwned>(blobs: &BlobSet, name: BlobName) -> SyncResult<Vec<T>> {
    let payload = match blobs.get(name) {
        Some(p) if !p.is_empty() => p,
        _ => return Ok(Vec::new()),
    };

    let json = decompress(payload)
        .ok_or_else(|| SyncError::malformed(name.as_str(), "payload does not decompress"))?;
    serde_json::from_str(&json).map_err(|e| SyncError::malformed(name.as_str(), e))
}

/// Decode all five blobs into a flat snapshot
pub fn decode_snapshot(blobs: &BlobSet) -> SyncResult<SyncData> {
    Ok(SyncData {
        spaces: decode_blob(blobs, BlobName::Spaces)?,
        collections: decode_blob(blobs, BlobName::Collections)?,
        labels: decode_blob(blobs, BlobName::Labels)?,
        cards: decode_blob(blobs, BlobName::Cards)?,
        favicons: decode_blob(blobs, BlobName::Favicons)?,
    })
}

fn encode_blob<T: Serialize>(set: &mut BlobSet, name: BlobName, records: &[T]) -> SyncResult<()> {
    let json = serde_json::to_string(records).map_err(|e| SyncError::malformed(name.as_str(), e))?;
    set.insert(name, compress(&json));
    Ok(())
}

/// Inverse of [`decode_snapshot`], for fixtures and local exports
pub fn encode_snapshot(data: &SyncData) -> SyncResult<BlobSet> {
    let mut set = BlobSet::new();
    encode_blob(&mut set, BlobName::Spaces, &data.spaces)?;
    encode_blob(&mut set, BlobName::Collections, &data.collections)?;
    encode_blob(&mut set, BlobName::Labels, &data.labels)?;
    encode_blob(&mut set, BlobName::Cards, &data.cards)?;
    encode_blob(&mut set, BlobName::Favicons, &data.favicons)?;
    Ok(set)
}
