//! # Error Types
//!
//! Errors produced while moving shared entities across the wire.

use thiserror::Error;

/// Failures of the canonical codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A value could not be serialized.
    #[error("Serialization failed for {type_name}: {reason}")]
    Serialization { type_name: &'static str, reason: String },

    /// Bytes could not be decoded as the expected type.
    #[error("Decoding {type_name} failed: {reason}")]
    Decode { type_name: &'static str, reason: String },
}

/// Errors raised when interpreting identifiers supplied by callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Namespace identifiers must be non-empty.
    #[error("Namespace identifier is empty")]
    EmptyNamespace,

    /// Namespace identifiers are restricted to lowercase alphanumerics, `.` and `-`.
    #[error("Invalid namespace identifier '{0}': only [a-z0-9.-] allowed, starting with a letter")]
    InvalidNamespace(String),
}
