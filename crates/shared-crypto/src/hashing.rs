//! # SHA-256 Digests
//!
//! Digests used for update fingerprints and transaction identifiers.

use sha2::{Digest, Sha256};

/// SHA-256 output (256-bit).
pub type Digest256 = [u8; 32];

/// One-shot SHA-256.
pub fn sha256(data: &[u8]) -> Digest256 {
    Sha256::digest(data).into()
}

/// SHA-256 over the concatenation of `parts`, without allocating the concatenation.
pub fn sha256_parts(parts: &[&[u8]]) -> Digest256 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
