//! Telemetry settings, read from the environment and adjusted by CLI flags.

use crate::TelemetryError;
use std::env;
use std::fmt;
use std::str::FromStr;

/// How log records are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, colored.
    #[default]
    Pretty,
    /// One JSON object per line (Loki field layout).
    Json,
    /// Nothing is written.
    Off,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "off" | "none" => Ok(LogFormat::Off),
            other => Err(TelemetryError::Config(format!(
                "unknown log format '{}' (expected pretty, json or off)",
                other
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Off => "off",
        })
    }
}

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Name attached to every log record
    pub service_name: String,

    /// Filter directive, e.g. `info` or `qc_channel_config=debug,warn`
    pub log_level: String,

    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "quantum-chain".to_string(),
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl TelemetryConfig {
    /// Settings for a named tool, from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_LOG_LEVEL`: filter directive (default: warn, tools are quiet)
    /// - `QC_LOG_FORMAT`: pretty, json or off (default: json inside
    ///   containers, pretty otherwise)
    ///
    /// An unparsable `QC_LOG_FORMAT` is an error rather than a silent default.
    pub fn for_tool(name: &str) -> Result<Self, TelemetryError> {
        let in_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        let format = match env::var("QC_LOG_FORMAT") {
            Ok(raw) => raw.parse()?,
            Err(_) if in_container => LogFormat::Json,
            Err(_) => LogFormat::Pretty,
        };

        Ok(Self {
            service_name: name.to_string(),
            log_level: env::var("QC_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
            format,
        })
    }

    /// Raise the level by `steps` (one per `-v`), capped at `trace`.
    ///
    /// Only plain level names are raised; a custom directive is left alone.
    pub fn with_verbosity(mut self, steps: u8) -> Self {
        if let Some(current) = LEVELS.iter().position(|l| l.eq_ignore_ascii_case(&self.log_level)) {
            let raised = (current + steps as usize).min(LEVELS.len() - 1);
            self.log_level = LEVELS[raised].to_string();
        }
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}
