use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use crate::error::Result;

/// Read size used while hashing, so large PDFs are never fully buffered.
const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// Compute the SHA-256 digest of a file's bytes as 64 lowercase hex chars.
///
/// Digest equality is treated as content equality by the ingestion pass.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// File name component used as `PageRecord::source_file`.
pub fn source_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
