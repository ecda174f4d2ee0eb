//! CommitWatcher
//!
//! Observes commitment by polling the namespace's config version until it
//! moves past a baseline. Only version monotonicity is inspected, never
//! content. The wait is bounded; dropping the future cancels it.

use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use crate::ports::outbound::LedgerQuery;
use shared_types::{BlockNumber, NamespaceId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

pub struct CommitWatcher<L: LedgerQuery> {
    ledger: Arc<L>,
    poll_interval: Duration,
}

impl<L: LedgerQuery> CommitWatcher<L> {
    /// Fails with `InvalidSettings` for a zero poll interval.
    pub fn new(ledger: Arc<L>, poll_interval: Duration) -> ConfigUpdateResult<Self> {
        if poll_interval.is_zero() {
            return Err(ConfigUpdateError::InvalidSettings {
                reason: "commit poll interval must be greater than zero".into(),
            });
        }
        Ok(Self {
            ledger,
            poll_interval,
        })
    }

    /// Wait until the committed version of `namespace` exceeds `baseline`.
    ///
    /// Returns the first observed version `> baseline`, or `CommitTimeout`
    /// once `timeout` has elapsed. A timeout says nothing about whether the
    /// update will commit. Failed version queries are logged and polling
    /// continues.
    pub async fn await_commit(
        &self,
        namespace: &NamespaceId,
        baseline: BlockNumber,
        timeout: Duration,
    ) -> ConfigUpdateResult<BlockNumber> {
        let started = Instant::now();
        let mut last_observed = None;

        let polled = tokio::time::timeout_at(
            started + timeout,
            self.poll_past(namespace, baseline, &mut last_observed),
        )
        .await;

        match polled {
            Ok(version) => {
                info!(
                    namespace = %namespace,
                    baseline,
                    version,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "[qc-channel-config] Config update observed as committed"
                );
                Ok(version)
            }
            Err(_) => {
                let waited = started.elapsed();
                warn!(
                    namespace = %namespace,
                    baseline,
                    ?last_observed,
                    waited_ms = waited.as_millis() as u64,
                    "[qc-channel-config] ⏱️ Commit not observed before timeout"
                );
                Err(ConfigUpdateError::CommitTimeout {
                    namespace: namespace.clone(),
                    baseline,
                    last_observed,
                    waited,
                })
            }
        }
    }

    async fn poll_past(
        &self,
        namespace: &NamespaceId,
        baseline: BlockNumber,
        last_observed: &mut Option<BlockNumber>,
    ) -> BlockNumber {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.ledger.fetch_current_version(namespace).await {
                Ok(version) if version > baseline => {
                    *last_observed = Some(version);
                    return version;
                }
                Ok(version) => {
                    *last_observed = Some(version);
                    debug!(namespace = %namespace, baseline, version, "[qc-channel-config] Waiting for commit");
                }
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "[qc-channel-config] Version query failed");
                }
            }
        }
    }
}
