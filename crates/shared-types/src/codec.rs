//! # Canonical Codec
//!
//! Length-prefixed binary encoding shared by every participant.
//!
//! The encoding is bincode with fixed-width little-endian integers, a hard
//! size limit and rejection of trailing bytes. Combined with `BTreeMap` for
//! every map in the configuration model this yields one byte sequence per
//! value, which is what lets a co-signer re-derive an update from two trees
//! and compare it byte-for-byte with what it is asked to sign.

use crate::errors::CodecError;
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Upper bound on any single encoded structure (16 MiB).
pub const MAX_ENCODED_LEN: u64 = 16 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_ENCODED_LEN)
        .reject_trailing_bytes()
}

/// Encode a value with the canonical options.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    options()
        .serialize(value)
        .map_err(|e| CodecError::Serialization {
            type_name: std::any::type_name::<T>(),
            reason: e.to_string(),
        })
}

/// Decode a value previously produced by [`encode`].
///
/// Trailing bytes are an error: a payload either is exactly one `T` or it
/// is not a `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    options()
        .deserialize(bytes)
        .map_err(|e| CodecError::Decode {
            type_name: std::any::type_name::<T>(),
            reason: e.to_string(),
        })
}
