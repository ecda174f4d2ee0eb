//! # Channel Configuration Metrics
//!
//! Prometheus metrics for the configuration update flow.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-channel-config = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `channel_config_updates_submitted_total` - Counter of envelopes accepted by ordering
//! - `channel_config_updates_committed_total` - Counter of updates observed as committed
//! - `channel_config_updates_noop_total` - Counter of update requests with nothing to change
//! - `channel_config_rejections_total` - Counter of ordering rejections (by reason)
//! - `channel_config_transport_retries_total` - Counter of transport retries
//! - `channel_config_signatures_collected_total` - Counter of co-signatures gathered
//! - `channel_config_commit_wait_seconds` - Histogram of submit-to-commit latency

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref UPDATES_SUBMITTED: IntCounter = register_int_counter!(
        "channel_config_updates_submitted_total",
        "Total number of config update envelopes acknowledged by ordering"
    )
    .expect("Failed to create UPDATES_SUBMITTED metric");

    pub static ref UPDATES_COMMITTED: IntCounter = register_int_counter!(
        "channel_config_updates_committed_total",
        "Total number of config updates observed as committed"
    )
    .expect("Failed to create UPDATES_COMMITTED metric");

    pub static ref UPDATES_NOOP: IntCounter = register_int_counter!(
        "channel_config_updates_noop_total",
        "Total number of update requests that changed nothing"
    )
    .expect("Failed to create UPDATES_NOOP metric");

    /// Rejections labeled by reason (stale, policy)
    pub static ref REJECTIONS: IntCounterVec = register_int_counter_vec!(
        "channel_config_rejections_total",
        "Total number of config updates rejected by ordering",
        &["reason"]
    )
    .expect("Failed to create REJECTIONS metric");

    pub static ref TRANSPORT_RETRIES: IntCounter = register_int_counter!(
        "channel_config_transport_retries_total",
        "Total number of broadcast retries after transport errors"
    )
    .expect("Failed to create TRANSPORT_RETRIES metric");

    pub static ref SIGNATURES_COLLECTED: IntCounter = register_int_counter!(
        "channel_config_signatures_collected_total",
        "Total number of co-signatures collected"
    )
    .expect("Failed to create SIGNATURES_COLLECTED metric");

    pub static ref COMMIT_WAIT: Histogram = register_histogram!(
        "channel_config_commit_wait_seconds",
        "Time between acknowledgement and observed commit",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("Failed to create COMMIT_WAIT metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_update_submitted() {
    UPDATES_SUBMITTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_update_committed(wait_secs: f64) {
    UPDATES_COMMITTED.inc();
    COMMIT_WAIT.observe(wait_secs);
}

#[cfg(feature = "metrics")]
pub fn record_update_noop() {
    UPDATES_NOOP.inc();
}

/// Record an ordering rejection with reason
#[cfg(feature = "metrics")]
pub fn record_rejection(reason: &str) {
    REJECTIONS.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_transport_retry() {
    TRANSPORT_RETRIES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_signatures_collected(count: u64) {
    SIGNATURES_COLLECTED.inc_by(count);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_update_submitted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_update_committed(_wait_secs: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_update_noop() {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejection(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_transport_retry() {}

#[cfg(not(feature = "metrics"))]
pub fn record_signatures_collected(_count: u64) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_noop_when_disabled() {
        record_update_submitted();
        record_update_committed(0.5);
        record_update_noop();
        record_rejection("rejected_stale");
        record_transport_retry();
        record_signatures_collected(3);
    }
}
