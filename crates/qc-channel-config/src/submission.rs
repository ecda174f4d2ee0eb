//! SubmissionClient
//!
//! Hands a signed envelope to the ordering service and waits for its
//! acknowledgement (receipt, not commit). Transport errors are retried with
//! exponential backoff; every other error is returned as is.

use crate::config::ChannelConfigSettings;
use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use crate::metrics;
use crate::ports::outbound::{OrderingService, SubmitAck};
use shared_types::{NamespaceId, SignedEnvelope};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Backoff schedule for transport retries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &ChannelConfigSettings) -> Self {
        Self {
            max_retries: settings.max_transport_retries,
            initial_delay: settings.transport_backoff_initial,
            max_delay: settings.transport_backoff_max,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

pub struct SubmissionClient<O: OrderingService> {
    ordering: Arc<O>,
    retry: RetryPolicy,
}

impl<O: OrderingService> SubmissionClient<O> {
    pub fn new(ordering: Arc<O>, retry: RetryPolicy) -> Self {
        Self { ordering, retry }
    }

    /// Submit `envelope` to `target`.
    ///
    /// Fails with `StructuralMismatch` without contacting the ordering
    /// service if the envelope is addressed to a different namespace.
    pub async fn submit(
        &self,
        envelope: &SignedEnvelope,
        target: &NamespaceId,
    ) -> ConfigUpdateResult<SubmitAck> {
        if &envelope.header.namespace != target {
            return Err(ConfigUpdateError::StructuralMismatch {
                reason: format!(
                    "envelope addressed to '{}', submitted to '{}'",
                    envelope.header.namespace, target
                ),
            });
        }

        let mut attempt = 0u32;
        loop {
            match self.ordering.broadcast(envelope).await {
                Ok(ack) => {
                    metrics::record_update_submitted();
                    info!(
                        namespace = %target,
                        tx_id = %ack.tx_id,
                        attempt,
                        "[qc-channel-config] 📤 Config update acknowledged by ordering"
                    );
                    return Ok(ack);
                }
                Err(ConfigUpdateError::Transport { reason }) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    metrics::record_transport_retry();
                    warn!(
                        namespace = %target,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %reason,
                        "[qc-channel-config] Broadcast failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if matches!(
                        e,
                        ConfigUpdateError::RejectedStale { .. } | ConfigUpdateError::RejectedByPolicy { .. }
                    ) {
                        metrics::record_rejection(e.kind());
                    }
                    warn!(namespace = %target, error = %e, "[qc-channel-config] Config update not accepted");
                    return Err(e);
                }
            }
        }
    }
}
