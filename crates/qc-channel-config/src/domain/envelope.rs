//! UpdateEnvelopeBuilder
//!
//! Wraps a [`ConfigUpdate`] into a `CONFIG_UPDATE` envelope and adds the
//! primary signature. Co-signatures are added by the
//! [`SignatureCollector`](super::signatures::SignatureCollector).

use super::update::ConfigUpdate;
use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use crate::ports::outbound::ConfigSigner;
use rand::RngCore;
use shared_types::{
    unix_timestamp, ConfigSignature, EnvelopeHeader, HeaderType, NamespaceId, SerializedIdentity,
    SignedEnvelope,
};
use tracing::debug;

/// Builds signed `CONFIG_UPDATE` envelopes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateEnvelopeBuilder {
    message_version: i32,
    epoch: u64,
}

impl UpdateEnvelopeBuilder {
    pub fn new(message_version: i32, epoch: u64) -> Self {
        Self {
            message_version,
            epoch,
        }
    }

    /// Fresh header with a random nonce and the derived `tx_id`.
    pub fn header(
        &self,
        namespace: &NamespaceId,
        creator: &SerializedIdentity,
    ) -> ConfigUpdateResult<EnvelopeHeader> {
        let mut nonce = vec![0u8; EnvelopeHeader::NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let tx_id = EnvelopeHeader::compute_tx_id(&nonce, creator)
            .map_err(|e| ConfigUpdateError::serialization("EnvelopeHeader", e))?;

        Ok(EnvelopeHeader {
            header_type: HeaderType::ConfigUpdate,
            namespace: namespace.clone(),
            message_version: self.message_version,
            epoch: self.epoch,
            timestamp: unix_timestamp(),
            creator: creator.clone(),
            nonce,
            tx_id,
        })
    }

    /// Serialize `update`, stamp the header and sign with `signer`.
    pub async fn build(
        &self,
        update: &ConfigUpdate,
        namespace: &NamespaceId,
        signer: &dyn ConfigSigner,
    ) -> ConfigUpdateResult<SignedEnvelope> {
        if &update.namespace != namespace {
            return Err(ConfigUpdateError::StructuralMismatch {
                reason: format!(
                    "update computed for '{}' cannot be sent to '{}'",
                    update.namespace, namespace
                ),
            });
        }

        let payload = update.to_bytes()?;
        let header = self.header(namespace, signer.identity())?;
        let mut envelope = SignedEnvelope::unsigned(header, payload);

        let signing_bytes = envelope
            .signing_bytes()
            .map_err(|e| ConfigUpdateError::serialization("SignedEnvelope", e))?;
        let signature = signer
            .sign(&signing_bytes)
            .await
            .map_err(|e| ConfigUpdateError::SigningUnavailable {
                signer: signer.identity().to_string(),
                reason: e.to_string(),
            })?;
        envelope.signatures.push(ConfigSignature {
            signer: signer.identity().clone(),
            signature,
        });

        debug!(
            namespace = %namespace,
            tx_id = %envelope.header.tx_id,
            creator = %signer.identity(),
            payload_len = envelope.payload.len(),
            "[qc-channel-config] Built config update envelope"
        );
        Ok(envelope)
    }
}
