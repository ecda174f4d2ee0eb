//! # `SignedEnvelope`
//!
//! The wrapper every configuration update travels in on its way to the
//! ordering service.
//!
//! ## Layout
//!
//! ```text
//! SignedEnvelope
//! ├── header      EnvelopeHeader { type, namespace, version, epoch, timestamp, creator, nonce, tx_id }
//! ├── payload     canonical bytes of the ConfigUpdate
//! └── signatures  [(identity, signature)]  in the order they were collected
//! ```
//!
//! Every signature covers [`SignedEnvelope::signing_bytes`], i.e. the encoded
//! header followed by the payload. Signatures are therefore independent of
//! each other and may be gathered in any order.

use crate::codec::{decode, encode};
use crate::entities::{NamespaceId, SerializedIdentity};
use crate::errors::CodecError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of payload carried by an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderType {
    /// A complete configuration (genesis or committed config block).
    Config,
    /// A read-set/write-set delta against the current configuration.
    ConfigUpdate,
}

/// Header stamped onto every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeHeader {
    pub header_type: HeaderType,
    /// Namespace the payload targets.
    pub namespace: NamespaceId,
    /// Message format version.
    pub message_version: i32,
    pub epoch: u64,
    /// Unix timestamp (seconds) at creation.
    pub timestamp: u64,
    /// Identity of the submitter (first signer).
    pub creator: SerializedIdentity,
    /// Random bytes making `tx_id` unique.
    pub nonce: Vec<u8>,
    /// Hex SHA-256 of `nonce || encode(creator)`.
    pub tx_id: String,
}

impl EnvelopeHeader {
    /// Length of the random nonce in bytes.
    pub const NONCE_LEN: usize = 24;

    /// Derive the transaction identifier from a nonce and the creator.
    pub fn compute_tx_id(
        nonce: &[u8],
        creator: &SerializedIdentity,
    ) -> Result<String, CodecError> {
        let mut hasher = Sha256::new();
        hasher.update(nonce);
        hasher.update(encode(creator)?);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Check that `tx_id` matches `nonce` and `creator`.
    pub fn tx_id_is_consistent(&self) -> bool {
        Self::compute_tx_id(&self.nonce, &self.creator)
            .map(|expected| expected == self.tx_id)
            .unwrap_or(false)
    }
}

/// One signature over an envelope's signing bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSignature {
    pub signer: SerializedIdentity,
    pub signature: Vec<u8>,
}

/// A header-stamped, signed configuration payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub header: EnvelopeHeader,
    pub payload: Vec<u8>,
    pub signatures: Vec<ConfigSignature>,
}

impl SignedEnvelope {
    /// Create an unsigned envelope.
    pub fn unsigned(header: EnvelopeHeader, payload: Vec<u8>) -> Self {
        Self {
            header,
            payload,
            signatures: Vec::new(),
        }
    }

    /// Bytes covered by every signature: `encode(header) || payload`.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut bytes = encode(&self.header)?;
        bytes.extend_from_slice(&self.payload);
        Ok(bytes)
    }

    /// Identities that have signed, in collection order.
    pub fn signers(&self) -> impl Iterator<Item = &SerializedIdentity> {
        self.signatures.iter().map(|s| &s.signer)
    }

    /// Whether `identity` already contributed a signature.
    pub fn is_signed_by(&self, identity: &SerializedIdentity) -> bool {
        self.signers().any(|s| s == identity)
    }

    /// Canonical wire bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    /// Parse canonical wire bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(bytes)
    }
}
