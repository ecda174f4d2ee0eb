//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The ledger, the ordering service and signing identities are external
//! collaborators. Everything in this crate talks to them through these traits.

use crate::domain::ConfigTree;
use crate::error::ConfigUpdateResult;
use async_trait::async_trait;
use shared_types::{BlockNumber, NamespaceId, SerializedIdentity, SignedEnvelope};
use thiserror::Error;

/// Read access to committed configuration.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Latest committed configuration tree of `namespace`.
    async fn fetch_current_config(&self, namespace: &NamespaceId) -> ConfigUpdateResult<ConfigTree>;

    /// Block number of the latest committed configuration of `namespace`.
    ///
    /// Strictly increases with every committed configuration update.
    async fn fetch_current_version(&self, namespace: &NamespaceId) -> ConfigUpdateResult<BlockNumber>;
}

/// Receipt acknowledgement from the ordering service (not a commit).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitAck {
    pub tx_id: String,
    pub namespace: NamespaceId,
}

/// Ordering/commitment service.
///
/// Errors: `RejectedByPolicy`, `RejectedStale`, `Transport`, and
/// `MalformedUpdate` for envelopes it cannot interpret.
#[async_trait]
pub trait OrderingService: Send + Sync {
    async fn broadcast(&self, envelope: &SignedEnvelope) -> ConfigUpdateResult<SubmitAck>;
}

/// Failure reported by a signing identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SigningError(pub String);

/// A signing identity. Key management lives behind this trait.
#[async_trait]
pub trait ConfigSigner: Send + Sync {
    fn identity(&self) -> &SerializedIdentity;

    /// Detached signature over `payload`.
    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SigningError>;
}
