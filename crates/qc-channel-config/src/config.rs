//! Runtime settings for the configuration update flow.

use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Tunables for submission, confirmation and retries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfigSettings {
    /// Delay between two version polls while awaiting a commit.
    pub poll_interval: Duration,
    /// Upper bound on waiting for a commit.
    pub commit_timeout: Duration,
    /// Broadcast retries after transport errors (0 = no retry).
    pub max_transport_retries: u32,
    pub transport_backoff_initial: Duration,
    pub transport_backoff_max: Duration,
    /// Recompute-and-resubmit rounds after a stale rejection.
    pub max_stale_retries: u32,
    /// Request co-signatures concurrently.
    pub concurrent_signing: bool,
    pub message_version: i32,
    pub epoch: u64,
}

impl Default for ChannelConfigSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            commit_timeout: Duration::from_secs(60),
            max_transport_retries: 3,
            transport_backoff_initial: Duration::from_millis(100),
            transport_backoff_max: Duration::from_secs(2),
            max_stale_retries: 3,
            concurrent_signing: false,
            message_version: 0,
            epoch: 0,
        }
    }
}

impl ChannelConfigSettings {
    /// Create settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_CONFIG_POLL_INTERVAL_MS` (default: 250)
    /// - `QC_CONFIG_COMMIT_TIMEOUT_SECS` (default: 60)
    /// - `QC_CONFIG_TRANSPORT_RETRIES` (default: 3)
    /// - `QC_CONFIG_BACKOFF_INITIAL_MS` (default: 100)
    /// - `QC_CONFIG_BACKOFF_MAX_MS` (default: 2000)
    /// - `QC_CONFIG_STALE_RETRIES` (default: 3)
    /// - `QC_CONFIG_CONCURRENT_SIGNING` (default: false)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: env_parse("QC_CONFIG_POLL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            commit_timeout: env_parse("QC_CONFIG_COMMIT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.commit_timeout),
            max_transport_retries: env_parse("QC_CONFIG_TRANSPORT_RETRIES")
                .unwrap_or(defaults.max_transport_retries),
            transport_backoff_initial: env_parse("QC_CONFIG_BACKOFF_INITIAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.transport_backoff_initial),
            transport_backoff_max: env_parse("QC_CONFIG_BACKOFF_MAX_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.transport_backoff_max),
            max_stale_retries: env_parse("QC_CONFIG_STALE_RETRIES")
                .unwrap_or(defaults.max_stale_retries),
            concurrent_signing: env::var("QC_CONFIG_CONCURRENT_SIGNING")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.concurrent_signing),
            ..defaults
        }
    }

    /// Reject combinations the flow cannot run with.
    pub fn validate(&self) -> ConfigUpdateResult<()> {
        let invalid = |reason: &str| -> ConfigUpdateResult<()> {
            Err(ConfigUpdateError::InvalidSettings {
                reason: reason.to_string(),
            })
        };
        if self.poll_interval.is_zero() {
            return invalid("poll_interval must be non-zero");
        }
        if self.commit_timeout.is_zero() {
            return invalid("commit_timeout must be non-zero");
        }
        if self.poll_interval > self.commit_timeout {
            return invalid("poll_interval exceeds commit_timeout");
        }
        if self.transport_backoff_initial > self.transport_backoff_max {
            return invalid("transport_backoff_initial exceeds transport_backoff_max");
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
