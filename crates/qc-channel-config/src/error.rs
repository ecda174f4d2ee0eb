//! Error types for the Channel Configuration subsystem
//!
//! | Variant | Fatal? | Caller action |
//! |---------|--------|---------------|
//! | `StructuralMismatch` | yes | fix inputs |
//! | `Decode` / `Serialization` | yes | abort, no retry |
//! | `SigningUnavailable` | this attempt | retry the whole flow |
//! | `RejectedByPolicy` | yes | obtain more signatures |
//! | `RejectedStale` | no | re-fetch and recompute |
//! | `Transport` | no | retry with backoff |
//! | `CommitTimeout` | ambiguous | re-query the current version |

use shared_types::{BlockNumber, CodecError, NamespaceId, Version};
use std::time::Duration;
use thiserror::Error;

/// Channel configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigUpdateError {
    /// Current and desired trees cannot be reconciled
    #[error("Structural mismatch: {reason}")]
    StructuralMismatch { reason: String },

    /// Bytes could not be decoded as the expected document
    #[error("Decode error in {context}: {reason}")]
    Decode { context: String, reason: String },

    /// A value could not be serialized
    #[error("Serialization error in {context}: {reason}")]
    Serialization { context: String, reason: String },

    /// A required signer could not produce a signature
    #[error("Signing unavailable for {signer}: {reason}")]
    SigningUnavailable { signer: String, reason: String },

    /// Signatures do not satisfy the governing policy of a modified element
    #[error("Rejected by policy: {policy} does not authorize change to {path}")]
    RejectedByPolicy { path: String, policy: String },

    /// Read-set or write-set versions no longer match the committed state
    ///
    /// `None` means the element is (expected to be) absent.
    #[error(
        "Rejected as stale at {path}: expected {}, committed {}",
        describe_version(.expected),
        describe_version(.committed)
    )]
    RejectedStale {
        path: String,
        expected: Option<Version>,
        committed: Option<Version>,
    },

    /// Connectivity failure talking to the ordering service or ledger
    #[error("Transport error: {reason}")]
    Transport { reason: String },

    /// Commit was not observed before the deadline; outcome unknown
    #[error("Commit not observed within {waited:?} (baseline {baseline}, last observed {last_observed:?})")]
    CommitTimeout {
        namespace: NamespaceId,
        baseline: BlockNumber,
        last_observed: Option<BlockNumber>,
        waited: Duration,
    },

    /// Addressed element does not exist in the tree
    #[error("Not found in configuration: {path}")]
    ValueNotFound { path: String },

    /// Update violates structural rules of the write-set
    #[error("Malformed update at {path}: {reason}")]
    MalformedUpdate { path: String, reason: String },

    /// Ledger query collaborator failed
    #[error("Ledger query failed: {reason}")]
    Ledger { reason: String },

    /// Runtime settings are inconsistent
    #[error("Invalid settings: {reason}")]
    InvalidSettings { reason: String },
}

impl ConfigUpdateError {
    /// Errors after which repeating the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConfigUpdateError::RejectedStale { .. } | ConfigUpdateError::Transport { .. }
        )
    }

    /// Errors that leave the outcome of a submission unknown.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ConfigUpdateError::CommitTimeout { .. })
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigUpdateError::StructuralMismatch { .. } => "structural_mismatch",
            ConfigUpdateError::Decode { .. } => "decode",
            ConfigUpdateError::Serialization { .. } => "serialization",
            ConfigUpdateError::SigningUnavailable { .. } => "signing_unavailable",
            ConfigUpdateError::RejectedByPolicy { .. } => "rejected_by_policy",
            ConfigUpdateError::RejectedStale { .. } => "rejected_stale",
            ConfigUpdateError::Transport { .. } => "transport",
            ConfigUpdateError::CommitTimeout { .. } => "commit_timeout",
            ConfigUpdateError::ValueNotFound { .. } => "value_not_found",
            ConfigUpdateError::MalformedUpdate { .. } => "malformed_update",
            ConfigUpdateError::Ledger { .. } => "ledger",
            ConfigUpdateError::InvalidSettings { .. } => "invalid_settings",
        }
    }

    pub(crate) fn decode(context: impl Into<String>, err: CodecError) -> Self {
        ConfigUpdateError::Decode {
            context: context.into(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn serialization(context: impl Into<String>, err: CodecError) -> Self {
        ConfigUpdateError::Serialization {
            context: context.into(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn malformed(path: impl ToString, reason: impl Into<String>) -> Self {
        ConfigUpdateError::MalformedUpdate {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// The element at `path` already sits at the largest representable version.
    pub(crate) fn version_exhausted(path: impl ToString, version: Version) -> Self {
        ConfigUpdateError::StructuralMismatch {
            reason: format!(
                "version of {} cannot be incremented past {}",
                path.to_string(),
                version
            ),
        }
    }

    pub(crate) fn stale(
        path: impl ToString,
        expected: Option<Version>,
        committed: Option<Version>,
    ) -> Self {
        ConfigUpdateError::RejectedStale {
            path: path.to_string(),
            expected,
            committed,
        }
    }
}

fn describe_version(version: &Option<Version>) -> String {
    match version {
        Some(v) => format!("version {}", v),
        None => "absent".to_string(),
    }
}

/// Result type for channel configuration operations
pub type ConfigUpdateResult<T> = Result<T, ConfigUpdateError>;
