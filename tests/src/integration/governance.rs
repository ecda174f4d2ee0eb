//! Governance: which signature sets a committed configuration accepts.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use async_trait::async_trait;
    use qc_channel_config::ports::outbound::SigningError;
    use qc_channel_config::{
        ChannelConfigApi, ConfigSigner, ConfigUpdateError, LocalSigner, UpdateOutcome,
    };
    use shared_types::{IdentityRole, SerializedIdentity};
    use std::sync::Arc;

    /// Co-signer whose key store is offline.
    struct OfflineSigner {
        identity: SerializedIdentity,
    }

    #[async_trait]
    impl ConfigSigner for OfflineSigner {
        fn identity(&self) -> &SerializedIdentity {
            &self.identity
        }

        async fn sign(&self, _payload: &[u8]) -> Result<Vec<u8>, SigningError> {
            Err(SigningError("hsm offline".into()))
        }
    }

    #[tokio::test]
    async fn test_single_org_cannot_change_majority_governed_value() {
        let ledger = enrolled_ledger(&["a"]);
        let svc = service(&ledger, fast_settings());
        let current = svc.current_config(&namespace()).await.unwrap();

        let err = svc
            .update_config(&current, &with_batch_size(&current, "50"), &[])
            .await
            .unwrap_err();

        match err {
            ConfigUpdateError::RejectedByPolicy { path, policy } => {
                assert_eq!(path, "/Channel/Orderer/BatchSize");
                assert_eq!(policy, "Admins");
            }
            other => panic!("expected policy rejection, got {other:?}"),
        }
        assert!(ledger.committed_tx_ids(&namespace()).is_empty());
    }

    #[tokio::test]
    async fn test_co_signed_update_commits() {
        let ledger = enrolled_ledger(&["a"]);
        let svc = service(&ledger, fast_settings());
        let current = svc.current_config(&namespace()).await.unwrap();

        let outcome = svc
            .update_config(&current, &with_batch_size(&current, "50"), &co_signers())
            .await
            .unwrap();

        let tx_ids = ledger.committed_tx_ids(&namespace());
        assert_eq!(
            outcome,
            UpdateOutcome::Committed {
                version: 1,
                tx_id: tx_ids[0].clone(),
            }
        );
        let committed = ledger.committed(&namespace()).unwrap();
        assert_eq!(committed.value(&batch_size()).unwrap().value, b"50".to_vec());
        assert_eq!(committed.sequence, 1);
    }

    #[tokio::test]
    async fn test_signature_from_wrong_role_does_not_count() {
        let ledger = enrolled_ledger(&["a"]);
        let svc = service(&ledger, fast_settings());
        let current = svc.current_config(&namespace()).await.unwrap();

        let member: Arc<dyn ConfigSigner> = Arc::new(peer(ORG2));
        let err = svc
            .update_config(&current, &with_batch_size(&current, "50"), &[member])
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigUpdateError::RejectedByPolicy { .. }));
    }

    #[tokio::test]
    async fn test_self_minted_admin_key_cannot_co_sign() {
        let ledger = enrolled_ledger(&["a"]);
        let svc = service(&ledger, fast_settings());
        let current = svc.current_config(&namespace()).await.unwrap();

        let forged: Arc<dyn ConfigSigner> = Arc::new(LocalSigner::generate(ORG2, IdentityRole::Admin));
        let err = svc
            .update_config(&current, &with_batch_size(&current, "9999"), &[forged])
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigUpdateError::RejectedByPolicy { .. }));
        let committed = ledger.committed(&namespace()).unwrap();
        assert_eq!(committed.value(&batch_size()).unwrap().value, b"10".to_vec());
    }

    #[tokio::test]
    async fn test_unavailable_co_signer_aborts_before_submission() {
        let ledger = enrolled_ledger(&["a"]);
        let svc = service(&ledger, fast_settings());
        let current = svc.current_config(&namespace()).await.unwrap();

        let offline: Arc<dyn ConfigSigner> = Arc::new(OfflineSigner {
            identity: admin(ORG2).identity().clone(),
        });
        let err = svc
            .update_config(&current, &with_batch_size(&current, "50"), &[offline])
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigUpdateError::SigningUnavailable { .. }));
        assert!(ledger.committed_tx_ids(&namespace()).is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_signing_commits_like_sequential() {
        let ledger = enrolled_ledger(&["a"]);
        let settings = qc_channel_config::ChannelConfigSettings {
            concurrent_signing: true,
            ..fast_settings()
        };
        let svc = service(&ledger, settings);
        let current = svc.current_config(&namespace()).await.unwrap();

        let signers: Vec<Arc<dyn ConfigSigner>> = vec![
            Arc::new(admin(ORG2)),
            Arc::new(peer(ORG2)),
        ];
        let outcome = svc
            .update_config(&current, &with_batch_size(&current, "70"), &signers)
            .await
            .unwrap();

        assert!(outcome.is_committed());
    }
}
