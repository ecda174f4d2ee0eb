//! Prometheus text exposition.
//!
//! Subsystem crates register their collectors in the prometheus default
//! registry (`register_int_counter!` and friends); this renders it.

use prometheus::{Encoder, TextEncoder};

use crate::TelemetryError;

/// Render every metric in the default registry in the Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsEncode(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsEncode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{register_int_counter, IntCounter};

    #[test]
    fn test_registered_counter_is_rendered() {
        let counter: IntCounter = register_int_counter!(
            "qc_telemetry_test_events_total",
            "Counter registered by the telemetry test"
        )
        .unwrap();
        counter.inc();

        let text = gather_metrics().unwrap();
        assert!(text.contains("qc_telemetry_test_events_total 1"));
    }
}
