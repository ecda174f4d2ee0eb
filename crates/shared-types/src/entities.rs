//! # Core Entities
//!
//! Identifiers and identities shared by every participant of a channel.
//!
//! ## Clusters
//!
//! - **Scoping**: `NamespaceId` (the channel a configuration belongs to)
//! - **Versioning**: `Version`, `BlockNumber`
//! - **Identity**: `SerializedIdentity`, `IdentityRole`

use crate::errors::IdentifierError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Per-element configuration version (optimistic concurrency token).
pub type Version = u64;

/// Height of a block in a channel's ledger.
pub type BlockNumber = u64;

// =============================================================================
// NAMESPACE
// =============================================================================

/// Identifier of an isolated configuration and ledger scope (a channel).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceId(String);

impl NamespaceId {
    /// Maximum accepted identifier length.
    pub const MAX_LEN: usize = 249;

    /// Parse and validate a namespace identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentifierError::EmptyNamespace);
        }
        let mut chars = id.chars();
        let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
        let rest_valid = id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-');
        if !starts_with_letter || !rest_valid || id.len() > Self::MAX_LEN {
            return Err(IdentifierError::InvalidNamespace(id));
        }
        Ok(Self(id))
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Role an identity holds inside its organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdentityRole {
    Member,
    Admin,
    Orderer,
}

impl fmt::Display for IdentityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IdentityRole::Member => "member",
            IdentityRole::Admin => "admin",
            IdentityRole::Orderer => "orderer",
        };
        f.write_str(s)
    }
}

/// The public, serialized form of a signing identity.
///
/// Signatures in an envelope are attributed to one of these; the ordering
/// service verifies each signature with `public_key` and then evaluates
/// policies against `(org, role)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SerializedIdentity {
    /// Organization (membership provider) the identity belongs to.
    pub org: String,
    /// Role within the organization.
    pub role: IdentityRole,
    /// Raw Ed25519 verifying key.
    pub public_key: Vec<u8>,
}

impl SerializedIdentity {
    pub fn new(org: impl Into<String>, role: IdentityRole, public_key: Vec<u8>) -> Self {
        Self {
            org: org.into(),
            role,
            public_key,
        }
    }

    /// Short fingerprint used in logs (first 8 bytes of SHA-256 of the key).
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.public_key);
        hex::encode(&digest[..8])
    }
}

impl fmt::Display for SerializedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.org, self.role, self.fingerprint())
    }
}

/// Current unix time in seconds.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
