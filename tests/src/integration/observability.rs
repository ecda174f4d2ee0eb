//! Counters exported through the default prometheus registry.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use qc_channel_config::ChannelConfigApi;
    use quantum_telemetry::gather_metrics;
    use std::sync::Arc;

    /// Value of an unlabeled sample in text exposition output.
    fn sample(text: &str, name: &str) -> Option<f64> {
        text.lines()
            .find(|line| line.starts_with(name) && line[name.len()..].starts_with(' '))
            .and_then(|line| line.rsplit(' ').next())
            .and_then(|value| value.parse().ok())
    }

    #[tokio::test]
    async fn test_committed_update_is_counted() {
        let ledger = enrolled_ledger(&["a"]);
        let svc = service(&ledger, fast_settings());
        let current = svc.current_config(&namespace()).await.unwrap();

        svc.update_config(&current, &with_batch_size(&current, "40"), &co_signers())
            .await
            .unwrap();

        let text = gather_metrics().unwrap();
        assert!(sample(&text, "channel_config_updates_submitted_total").unwrap() >= 1.0);
        assert!(sample(&text, "channel_config_updates_committed_total").unwrap() >= 1.0);
        assert!(sample(&text, "channel_config_signatures_collected_total").unwrap() >= 1.0);
        assert!(text.contains("channel_config_commit_wait_seconds_bucket"));
    }

    #[tokio::test]
    async fn test_policy_rejection_is_labeled() {
        let ledger = enrolled_ledger(&["a"]);
        let svc = service(&ledger, fast_settings());
        let current = svc.current_config(&namespace()).await.unwrap();

        let _ = svc
            .update_config(&current, &with_batch_size(&current, "40"), &[])
            .await
            .unwrap_err();

        let text = gather_metrics().unwrap();
        assert!(text.contains("channel_config_rejections_total{reason=\""));
    }
}
