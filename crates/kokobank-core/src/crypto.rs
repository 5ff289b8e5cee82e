//! Hashing utilities for KokoBank
//!
//! Addresses are the trailing 20 bytes of a SHA-256 digest. State hashes are
//! SHA-256 over canonical JSON, hex-encoded.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::types::ADDRESS_LEN;

/// Derive a `0x`-prefixed address from the concatenation of `parts`
pub fn address_from_digest(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    format!("0x{}", hex::encode(&digest[digest.len() - ADDRESS_LEN..]))
}

/// Compute SHA256 hash of data
pub fn hash_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash any serializable object
pub fn hash_object<T: Serialize>(obj: &T) -> Result<String> {
    let json = serde_json::to_vec(obj)?;
    Ok(hash_sha256(&json))
}
