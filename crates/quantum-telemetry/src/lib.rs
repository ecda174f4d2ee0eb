//! # Quantum Telemetry
//!
//! Process-level observability for channel configuration tooling.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an env filter and a
//!   pretty or JSON formatter (Loki-compatible field layout)
//! - **Metrics**: Prometheus text exposition of the default registry, which is
//!   where `qc-channel-config` registers its counters when built with the
//!   `metrics` feature
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quantum_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::for_tool("qc-configtx")?.with_verbosity(args.verbose))?;
//! tracing::info!("ready");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QC_LOG_LEVEL` | `warn` | Filter directive (`RUST_LOG` takes precedence) |
//! | `QC_LOG_FORMAT` | `pretty` (`json` in containers) | `pretty`, `json` or `off` |

mod config;
mod logging;
mod metrics;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::init_logging;
pub use metrics::gather_metrics;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to encode metrics: {0}")]
    MetricsEncode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Held for the lifetime of the process; logs a shutdown line when dropped.
pub struct TelemetryGuard {
    service: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(service = %self.service, "Shutting down telemetry");
    }
}

/// Initialize logging for the process.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_logging(&config)?;
    Ok(TelemetryGuard {
        service: config.service_name,
    })
}
