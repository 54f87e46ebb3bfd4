use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{AppError, AppResult};

use super::index::TfidfIndex;

/// Bumped whenever the serialized layout changes; older blobs are rejected
/// rather than misread.
const BLOB_VERSION: u32 = 1;

/// Serializes the index to a single opaque blob at `path`, creating parent
/// directories as needed. The blob is a fixed-width version header followed
/// by the bincode-encoded index.
pub fn save_index(index: &TfidfIndex, path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut bytes = bincode::serialize(&BLOB_VERSION)
        .map_err(|e| AppError::Internal(format!("index serialization failed: {}", e)))?;
    let body = bincode::serialize(index)
        .map_err(|e| AppError::Internal(format!("index serialization failed: {}", e)))?;
    bytes.extend_from_slice(&body);

    let mut file = File::create(path)?;
    file.write_all(&bytes)?;

    tracing::info!(
        path = %path.display(),
        docs = index.num_docs(),
        vocab = index.vocab_size(),
        "Index blob written"
    );

    Ok(())
}

/// Deserializes and validates an index blob. Corrupt bytes, a version
/// mismatch, or broken structural invariants all fail with `DataIntegrity`;
/// a damaged index must never silently serve truncated data.
pub fn load_index(path: &Path) -> AppResult<TfidfIndex> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let version_len = std::mem::size_of::<u32>();
    if bytes.len() < version_len {
        return Err(AppError::DataIntegrity(format!(
            "index blob at {} is truncated",
            path.display()
        )));
    }

    let version: u32 = bincode::deserialize(&bytes[..version_len])
        .map_err(|e| AppError::DataIntegrity(format!("corrupt index blob header: {}", e)))?;
    if version != BLOB_VERSION {
        return Err(AppError::DataIntegrity(format!(
            "unsupported index blob version {} (expected {})",
            version, BLOB_VERSION
        )));
    }

    let index: TfidfIndex = bincode::deserialize(&bytes[version_len..])
        .map_err(|e| AppError::DataIntegrity(format!("corrupt index blob: {}", e)))?;
    index.validate()?;

    tracing::info!(
        path = %path.display(),
        docs = index.num_docs(),
        vocab = index.vocab_size(),
        "Index blob loaded"
    );

    Ok(index)
}
