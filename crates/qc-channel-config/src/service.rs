//! Channel Configuration Service
//!
//! Drives one update end to end:
//!
//! ```text
//! current ──► desired ──► compute_update ──► envelope (primary sig)
//!                                               │
//!                                   co-signatures (in order)
//!                                               │
//!                      baseline version ◄── ledger
//!                                               │
//!                                      submit ──► await commit
//! ```

use crate::config::ChannelConfigSettings;
use crate::domain::{
    compute_update, consenters, edit_consensus_metadata, ConfigTree, Consenter,
    ConsensusMetadataMutation, SignatureCollector, UpdateEnvelopeBuilder,
};
use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use crate::metrics;
use crate::ports::inbound::{ChannelConfigApi, UpdateOutcome};
use crate::ports::outbound::{ConfigSigner, LedgerQuery, OrderingService};
use crate::submission::{RetryPolicy, SubmissionClient};
use crate::watcher::CommitWatcher;
use async_trait::async_trait;
use shared_types::NamespaceId;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub struct ChannelConfigService<L: LedgerQuery, O: OrderingService> {
    settings: ChannelConfigSettings,
    ledger: Arc<L>,
    submission: SubmissionClient<O>,
    watcher: CommitWatcher<L>,
    envelopes: UpdateEnvelopeBuilder,
    signer: Arc<dyn ConfigSigner>,
}

impl<L: LedgerQuery, O: OrderingService> ChannelConfigService<L, O> {
    /// `signer` is the primary identity: it creates and first-signs every envelope.
    pub fn new(
        ledger: Arc<L>,
        ordering: Arc<O>,
        signer: Arc<dyn ConfigSigner>,
        settings: ChannelConfigSettings,
    ) -> ConfigUpdateResult<Self> {
        settings.validate()?;
        Ok(Self {
            submission: SubmissionClient::new(ordering, RetryPolicy::from_settings(&settings)),
            watcher: CommitWatcher::new(Arc::clone(&ledger), settings.poll_interval)?,
            envelopes: UpdateEnvelopeBuilder::new(settings.message_version, settings.epoch),
            ledger,
            signer,
            settings,
        })
    }

    pub fn settings(&self) -> &ChannelConfigSettings {
        &self.settings
    }

    /// Fetch, edit, update. On `RejectedStale` the tree is fetched again and
    /// the edit recomputed, up to `max_stale_retries` times.
    pub async fn apply_edit<F>(
        &self,
        namespace: &NamespaceId,
        edit: F,
        co_signers: &[Arc<dyn ConfigSigner>],
    ) -> ConfigUpdateResult<UpdateOutcome>
    where
        F: Fn(&ConfigTree) -> ConfigUpdateResult<ConfigTree> + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            let current = self.ledger.fetch_current_config(namespace).await?;
            let desired = edit(&current)?;
            match self.run_update(&current, &desired, co_signers).await {
                Err(e @ ConfigUpdateError::RejectedStale { .. })
                    if attempt < self.settings.max_stale_retries =>
                {
                    attempt += 1;
                    warn!(
                        namespace = %namespace,
                        attempt,
                        error = %e,
                        "[qc-channel-config] Stale config, refetching and recomputing"
                    );
                }
                outcome => return outcome,
            }
        }
    }

    async fn run_update(
        &self,
        current: &ConfigTree,
        desired: &ConfigTree,
        co_signers: &[Arc<dyn ConfigSigner>],
    ) -> ConfigUpdateResult<UpdateOutcome> {
        let namespace = &current.namespace;
        let update = compute_update(current, desired)?;
        if update.is_noop() {
            metrics::record_update_noop();
            info!(namespace = %namespace, "[qc-channel-config] No configuration change, nothing to submit");
            return Ok(UpdateOutcome::NoChange);
        }

        let envelope = self
            .envelopes
            .build(&update, namespace, self.signer.as_ref())
            .await?;
        let envelope = SignatureCollector::new(co_signers.to_vec())
            .concurrent(self.settings.concurrent_signing)
            .collect(envelope)
            .await?;

        let baseline = self.ledger.fetch_current_version(namespace).await?;
        let ack = self.submission.submit(&envelope, namespace).await?;

        let started = Instant::now();
        let version = self
            .watcher
            .await_commit(namespace, baseline, self.settings.commit_timeout)
            .await?;
        metrics::record_update_committed(started.elapsed().as_secs_f64());

        info!(
            namespace = %namespace,
            tx_id = %ack.tx_id,
            version,
            changes = update.changes().len(),
            "[qc-channel-config] ✅ Config update complete"
        );
        Ok(UpdateOutcome::Committed {
            version,
            tx_id: ack.tx_id,
        })
    }
}

#[async_trait]
impl<L, O> ChannelConfigApi for ChannelConfigService<L, O>
where
    L: LedgerQuery + 'static,
    O: OrderingService + 'static,
{
    async fn current_config(&self, namespace: &NamespaceId) -> ConfigUpdateResult<ConfigTree> {
        self.ledger.fetch_current_config(namespace).await
    }

    async fn update_config(
        &self,
        current: &ConfigTree,
        desired: &ConfigTree,
        co_signers: &[Arc<dyn ConfigSigner>],
    ) -> ConfigUpdateResult<UpdateOutcome> {
        self.run_update(current, desired, co_signers).await
    }

    async fn update_consensus_metadata(
        &self,
        namespace: &NamespaceId,
        mutation: ConsensusMetadataMutation,
        co_signers: &[Arc<dyn ConfigSigner>],
    ) -> ConfigUpdateResult<UpdateOutcome> {
        self.apply_edit(
            namespace,
            |tree| edit_consensus_metadata(tree, &mutation),
            co_signers,
        )
        .await
    }

    async fn add_consenter(
        &self,
        namespace: &NamespaceId,
        consenter: Consenter,
        co_signers: &[Arc<dyn ConfigSigner>],
    ) -> ConfigUpdateResult<UpdateOutcome> {
        info!(namespace = %namespace, consenter = %consenter.endpoint(), "[qc-channel-config] Adding consenter");
        self.update_consensus_metadata(
            namespace,
            ConsensusMetadataMutation::AddConsenter(consenter),
            co_signers,
        )
        .await
    }

    async fn remove_consenter(
        &self,
        namespace: &NamespaceId,
        certificate: Vec<u8>,
        co_signers: &[Arc<dyn ConfigSigner>],
    ) -> ConfigUpdateResult<UpdateOutcome> {
        info!(namespace = %namespace, "[qc-channel-config] Removing consenter");
        self.update_consensus_metadata(
            namespace,
            ConsensusMetadataMutation::RemoveConsenter { certificate },
            co_signers,
        )
        .await
    }

    async fn consenters(&self, namespace: &NamespaceId) -> ConfigUpdateResult<Vec<Consenter>> {
        let tree = self.ledger.fetch_current_config(namespace).await?;
        consenters(&tree)
    }
}
