//! Driving Ports (API - Inbound)

use crate::domain::{ConfigTree, Consenter, ConsensusMetadataMutation};
use crate::error::ConfigUpdateResult;
use crate::ports::outbound::ConfigSigner;
use async_trait::async_trait;
use shared_types::{BlockNumber, NamespaceId};
use std::sync::Arc;

/// Result of an update request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Current and desired configuration were identical; nothing was submitted.
    NoChange,
    /// The update was acknowledged and the namespace version moved past the baseline.
    Committed { version: BlockNumber, tx_id: String },
}

impl UpdateOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, UpdateOutcome::Committed { .. })
    }
}

/// Primary Channel Configuration API
///
/// Every update runs the full flow: diff, envelope, co-signatures, submit,
/// await commit. `co_signers` sign in the order given, after the service's
/// own identity.
#[async_trait]
pub trait ChannelConfigApi: Send + Sync {
    /// Fetch the latest committed configuration.
    async fn current_config(&self, namespace: &NamespaceId) -> ConfigUpdateResult<ConfigTree>;

    /// Submit the change from `current` to `desired` and wait for it to commit.
    ///
    /// `current` must be freshly fetched; its versions are the concurrency token.
    async fn update_config(
        &self,
        current: &ConfigTree,
        desired: &ConfigTree,
        co_signers: &[Arc<dyn ConfigSigner>],
    ) -> ConfigUpdateResult<UpdateOutcome>;

    /// Edit the consensus metadata nested in `Orderer/ConsensusType`.
    async fn update_consensus_metadata(
        &self,
        namespace: &NamespaceId,
        mutation: ConsensusMetadataMutation,
        co_signers: &[Arc<dyn ConfigSigner>],
    ) -> ConfigUpdateResult<UpdateOutcome>;

    /// Append a consenter.
    async fn add_consenter(
        &self,
        namespace: &NamespaceId,
        consenter: Consenter,
        co_signers: &[Arc<dyn ConfigSigner>],
    ) -> ConfigUpdateResult<UpdateOutcome>;

    /// Remove every consenter holding `certificate`. Returns `NoChange` when
    /// none does.
    async fn remove_consenter(
        &self,
        namespace: &NamespaceId,
        certificate: Vec<u8>,
        co_signers: &[Arc<dyn ConfigSigner>],
    ) -> ConfigUpdateResult<UpdateOutcome>;

    /// Current consenter set.
    async fn consenters(&self, namespace: &NamespaceId) -> ConfigUpdateResult<Vec<Consenter>>;
}
