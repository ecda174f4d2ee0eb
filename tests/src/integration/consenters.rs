//! Consenter set edits through the consensus metadata mutator.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use qc_channel_config::domain::ConsensusMetadataMutation;
    use qc_channel_config::{
        ChannelConfigApi, ConfigUpdateError, ConsensusType, Consenter, LedgerQuery,
        RaftMetadata, UpdateOutcome, ValueAddress,
    };
    use std::sync::Arc;

    fn hosts(list: Vec<Consenter>) -> Vec<String> {
        list.into_iter().map(|c| c.host).collect()
    }

    #[tokio::test]
    async fn test_add_then_remove_consenter_round_trip() {
        let ledger = enrolled_ledger(&["a", "b"]);
        let svc = service(&ledger, fast_settings());
        let ns = namespace();

        let added = svc
            .add_consenter(&ns, consenter("c"), &co_signers())
            .await
            .unwrap();
        assert!(matches!(added, UpdateOutcome::Committed { version: 1, .. }));
        assert_eq!(
            hosts(svc.consenters(&ns).await.unwrap()),
            ["a.example.com", "b.example.com", "c.example.com"]
        );

        let removed = svc
            .remove_consenter(&ns, client_cert("b"), &co_signers())
            .await
            .unwrap();
        assert!(matches!(removed, UpdateOutcome::Committed { version: 2, .. }));
        assert_eq!(
            hosts(svc.consenters(&ns).await.unwrap()),
            ["a.example.com", "c.example.com"]
        );
        assert_eq!(ledger.committed_tx_ids(&ns).len(), 2);
    }

    #[tokio::test]
    async fn test_consenter_edit_only_touches_consensus_type() {
        let ledger = enrolled_ledger(&["a"]);
        let svc = service(&ledger, fast_settings());
        let ns = namespace();

        svc.add_consenter(&ns, consenter("b"), &co_signers())
            .await
            .unwrap();

        let committed = ledger.committed(&ns).unwrap();
        let consensus_value = committed.value(&ValueAddress::consensus_type()).unwrap();
        assert_eq!(consensus_value.version, 1);
        assert_eq!(committed.value(&batch_size()).unwrap().version, 0);

        // Fields outside the consenter list survive the edit.
        let consensus = ConsensusType::from_bytes(&consensus_value.value).unwrap();
        assert_eq!(consensus.kind, "etcdraft");
        let metadata = RaftMetadata::from_bytes(&consensus.metadata).unwrap();
        assert_eq!(metadata.consenters.len(), 2);
        assert_eq!(metadata.options, Default::default());
    }

    #[tokio::test]
    async fn test_removing_absent_consenter_submits_nothing() {
        let ledger = enrolled_ledger(&["a", "b"]);
        let svc = service(&ledger, fast_settings());
        let ns = namespace();

        let outcome = svc
            .remove_consenter(&ns, client_cert("zz"), &co_signers())
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::NoChange);
        assert_eq!(ledger.fetch_current_version(&ns).await.unwrap(), 0);
        assert!(ledger.committed_tx_ids(&ns).is_empty());
    }

    #[tokio::test]
    async fn test_custom_mutation_rejecting_input_surfaces_decode_error() {
        let ledger = enrolled_ledger(&["a"]);
        let svc = service(&ledger, fast_settings());

        let mutation = ConsensusMetadataMutation::custom(|_bytes: &[u8]| {
            Err(ConfigUpdateError::Decode {
                context: "consensus metadata".into(),
                reason: "unsupported layout".into(),
            })
        });
        let err = svc
            .update_consensus_metadata(&namespace(), mutation, &co_signers())
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigUpdateError::Decode { .. }));
        assert!(ledger.committed_tx_ids(&namespace()).is_empty());
    }
}
