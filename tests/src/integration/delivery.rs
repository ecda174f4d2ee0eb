//! Delivery: racing submitters, flaky transport, commits that never land.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use qc_channel_config::ports::outbound::SubmitAck;
    use qc_channel_config::{
        ChannelConfigApi, ChannelConfigService, ChannelConfigSettings, ConfigUpdateError,
        ConfigUpdateResult, LedgerQuery, OrderingService, UpdateOutcome,
    };
    use shared_types::SignedEnvelope;
    use std::sync::Arc;
    use std::time::Duration;

    /// Accepts every envelope and never orders any of them.
    #[derive(Default)]
    struct BlackHoleOrdering {
        accepted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OrderingService for BlackHoleOrdering {
        async fn broadcast(&self, envelope: &SignedEnvelope) -> ConfigUpdateResult<SubmitAck> {
            self.accepted.lock().push(envelope.header.tx_id.clone());
            Ok(SubmitAck {
                tx_id: envelope.header.tx_id.clone(),
                namespace: envelope.header.namespace.clone(),
            })
        }
    }

    async fn advance_to(svc: &TestService, version: u64) {
        for step in 0..version {
            let current = svc.current_config(&namespace()).await.unwrap();
            let batch = format!("{}", 100 + step);
            svc.update_config(&current, &with_batch_size(&current, &batch), &co_signers())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_racing_updates_from_same_snapshot_commit_exactly_once() {
        let ledger = enrolled_ledger(&["a"]);
        let first = service(&ledger, fast_settings());
        let second = service(&ledger, fast_settings());
        advance_to(&first, 5).await;
        assert_eq!(ledger.fetch_current_version(&namespace()).await.unwrap(), 5);

        let snapshot = first.current_config(&namespace()).await.unwrap();
        let signers = co_signers();
        let first_desired = with_batch_size(&snapshot, "500");
        let second_desired = with_batch_size(&snapshot, "600");
        let (a, b) = tokio::join!(
            first.update_config(&snapshot, &first_desired, &signers),
            second.update_config(&snapshot, &second_desired, &signers),
        );

        let outcomes = [a, b];
        let committed: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
        assert_eq!(committed.len(), 1, "exactly one update wins: {outcomes:?}");
        assert!(matches!(committed[0], UpdateOutcome::Committed { version: 6, .. }));
        assert!(outcomes.iter().any(|o| matches!(
            o,
            Err(ConfigUpdateError::RejectedStale {
                expected: Some(5),
                committed: Some(6),
                ..
            })
        )));
        assert_eq!(ledger.fetch_current_version(&namespace()).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_apply_edit_recovers_from_stale_snapshot() {
        let ledger = enrolled_ledger(&["a"]);
        let svc = service(&ledger, fast_settings());
        let ns = namespace();

        // The edit runs against whatever is committed when it is fetched.
        svc.add_consenter(&ns, consenter("b"), &co_signers())
            .await
            .unwrap();
        let outcome = svc
            .apply_edit(&ns, |tree| Ok(with_batch_size(tree, "99")), &co_signers())
            .await
            .unwrap();

        assert!(matches!(outcome, UpdateOutcome::Committed { version: 2, .. }));
        assert_eq!(svc.consenters(&ns).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_transient_transport_failures_are_retried() {
        let ledger = enrolled_ledger(&["a"]);
        let svc = service(&ledger, fast_settings());
        let current = svc.current_config(&namespace()).await.unwrap();

        ledger.fail_next_broadcasts(2);
        let outcome = svc
            .update_config(&current, &with_batch_size(&current, "20"), &co_signers())
            .await
            .unwrap();

        assert!(outcome.is_committed());
        assert_eq!(ledger.committed_tx_ids(&namespace()).len(), 1);
    }

    #[tokio::test]
    async fn test_persistent_transport_failure_is_reported() {
        let ledger = enrolled_ledger(&["a"]);
        let settings = ChannelConfigSettings {
            max_transport_retries: 1,
            ..fast_settings()
        };
        let svc = service(&ledger, settings);
        let current = svc.current_config(&namespace()).await.unwrap();

        ledger.fail_next_broadcasts(5);
        let err = svc
            .update_config(&current, &with_batch_size(&current, "20"), &co_signers())
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigUpdateError::Transport { .. }));
        assert!(err.is_retryable());
        assert_eq!(ledger.fetch_current_version(&namespace()).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unobserved_commit_times_out_distinguishably() {
        let ledger = enrolled_ledger(&["a"]);
        let ordering = Arc::new(BlackHoleOrdering::default());
        let settings = ChannelConfigSettings {
            poll_interval: Duration::from_millis(250),
            commit_timeout: Duration::from_secs(3),
            ..fast_settings()
        };
        let svc = ChannelConfigService::new(
            Arc::clone(&ledger),
            Arc::clone(&ordering),
            Arc::new(admin(ORG1)),
            settings,
        )
        .unwrap();
        let current = svc.current_config(&namespace()).await.unwrap();

        let err = svc
            .update_config(&current, &with_batch_size(&current, "20"), &co_signers())
            .await
            .unwrap_err();

        match &err {
            ConfigUpdateError::CommitTimeout {
                namespace: ns,
                baseline,
                last_observed,
                waited,
            } => {
                assert_eq!(ns, &namespace());
                assert_eq!(*baseline, 0);
                assert_eq!(*last_observed, Some(0));
                assert!(*waited >= Duration::from_secs(3));
            }
            other => panic!("expected commit timeout, got {other:?}"),
        }
        assert!(err.is_ambiguous());
        assert_eq!(ordering.accepted.lock().len(), 1);
    }
}
