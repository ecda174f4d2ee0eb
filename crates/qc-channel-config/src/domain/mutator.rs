//! MetadataMutator: targeted edits of an opaque sub-document
//!
//! A mutator maps the encoded bytes of a nested document to new bytes. It
//! never sees the tree; [`edit_value`] locates the addressed value in a
//! copy-on-write clone of the tree and swaps the payload, so a failed
//! mutation leaves no partially edited tree behind.

use super::consensus::{Consenter, ConsensusType, RaftMetadata};
use super::tree::{ConfigTree, ValueAddress};
use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A pure transform over an encoded sub-document.
pub trait MetadataMutator: Send + Sync {
    /// Fails with `Decode` when `original` is not the expected document.
    fn mutate(&self, original: &[u8]) -> ConfigUpdateResult<Vec<u8>>;
}

/// Caller-supplied transform.
pub type CustomMutation = Arc<dyn Fn(&[u8]) -> ConfigUpdateResult<Vec<u8>> + Send + Sync>;

/// Known edits of the Raft metadata carried in `ConsensusType.metadata`.
#[derive(Clone)]
pub enum ConsensusMetadataMutation {
    /// Append a consenter.
    AddConsenter(Consenter),
    /// Drop every consenter holding `certificate` as client or server cert.
    /// Nothing matching is not an error; the input comes back unchanged.
    RemoveConsenter { certificate: Vec<u8> },
    Custom(CustomMutation),
}

impl ConsensusMetadataMutation {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[u8]) -> ConfigUpdateResult<Vec<u8>> + Send + Sync + 'static,
    {
        ConsensusMetadataMutation::Custom(Arc::new(f))
    }
}

impl fmt::Debug for ConsensusMetadataMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsensusMetadataMutation::AddConsenter(c) => {
                f.debug_tuple("AddConsenter").field(c).finish()
            }
            ConsensusMetadataMutation::RemoveConsenter { certificate } => f
                .debug_struct("RemoveConsenter")
                .field("certificate_len", &certificate.len())
                .finish(),
            ConsensusMetadataMutation::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl MetadataMutator for ConsensusMetadataMutation {
    fn mutate(&self, original: &[u8]) -> ConfigUpdateResult<Vec<u8>> {
        match self {
            ConsensusMetadataMutation::AddConsenter(consenter) => {
                let mut metadata = RaftMetadata::from_bytes(original)?;
                metadata.consenters.push(consenter.clone());
                metadata.to_bytes()
            }
            ConsensusMetadataMutation::RemoveConsenter { certificate } => {
                let mut metadata = RaftMetadata::from_bytes(original)?;
                let before = metadata.consenters.len();
                metadata.consenters.retain(|c| !c.has_certificate(certificate));
                if metadata.consenters.len() == before {
                    return Ok(original.to_vec());
                }
                metadata.to_bytes()
            }
            ConsensusMetadataMutation::Custom(f) => f(original),
        }
    }
}

/// Clone `tree` and replace the payload of the value at `address` with
/// `mutator(payload)`. The value keeps its `mod_policy` and version; the
/// diff assigns the new version.
pub fn edit_value(
    tree: &ConfigTree,
    address: &ValueAddress,
    mutator: &dyn MetadataMutator,
) -> ConfigUpdateResult<ConfigTree> {
    edit_value_with(tree, address, |payload| mutator.mutate(payload))
}

/// [`edit_value`] with a closure.
pub fn edit_value_with<F>(
    tree: &ConfigTree,
    address: &ValueAddress,
    mutate: F,
) -> ConfigUpdateResult<ConfigTree>
where
    F: FnOnce(&[u8]) -> ConfigUpdateResult<Vec<u8>>,
{
    let original = tree
        .value(address)
        .ok_or_else(|| ConfigUpdateError::ValueNotFound {
            path: address.to_string(),
        })?;
    let payload = mutate(&original.value)?;

    let mut desired = tree.clone();
    if let Some(value) = desired.value_mut(address) {
        value.value = payload;
    }
    Ok(desired)
}

/// Apply `mutator` to the metadata nested inside `Orderer/ConsensusType`.
pub fn edit_consensus_metadata(
    tree: &ConfigTree,
    mutator: &dyn MetadataMutator,
) -> ConfigUpdateResult<ConfigTree> {
    let address = ValueAddress::consensus_type();
    let desired = edit_value_with(tree, &address, |payload| {
        let mut consensus = ConsensusType::from_bytes(payload)?;
        consensus.metadata = mutator.mutate(&consensus.metadata)?;
        consensus.to_bytes()
    })?;
    debug!(
        namespace = %tree.namespace,
        value = %address,
        "[qc-channel-config] Edited consensus metadata"
    );
    Ok(desired)
}

/// Read the consenter list out of a tree.
pub fn consenters(tree: &ConfigTree) -> ConfigUpdateResult<Vec<Consenter>> {
    let address = ValueAddress::consensus_type();
    let value = tree
        .value(&address)
        .ok_or_else(|| ConfigUpdateError::ValueNotFound {
            path: address.to_string(),
        })?;
    let consensus = ConsensusType::from_bytes(&value.value)?;
    Ok(RaftMetadata::from_bytes(&consensus.metadata)?.consenters)
}
