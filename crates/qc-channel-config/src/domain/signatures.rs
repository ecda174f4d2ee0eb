//! SignatureCollector
//!
//! Adds co-signatures to an envelope from an ordered list of signers. The
//! resulting signature order always equals the signer order, whether the
//! requests run one after another or concurrently. Any failure discards the
//! envelope: the caller only ever gets a fully signed envelope back.

use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use crate::metrics;
use crate::ports::outbound::ConfigSigner;
use futures::future::try_join_all;
use shared_types::{ConfigSignature, SignedEnvelope};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SignatureCollector {
    signers: Vec<Arc<dyn ConfigSigner>>,
    concurrent: bool,
}

impl SignatureCollector {
    pub fn new(signers: Vec<Arc<dyn ConfigSigner>>) -> Self {
        Self {
            signers,
            concurrent: false,
        }
    }

    /// Issue signing requests concurrently.
    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Co-sign `envelope` with every signer.
    ///
    /// Signers that already signed the envelope are skipped.
    pub async fn collect(&self, mut envelope: SignedEnvelope) -> ConfigUpdateResult<SignedEnvelope> {
        let signing_bytes = envelope
            .signing_bytes()
            .map_err(|e| ConfigUpdateError::serialization("SignedEnvelope", e))?;

        let pending: Vec<&dyn ConfigSigner> = self
            .signers
            .iter()
            .map(Arc::as_ref)
            .filter(|s| {
                let already = envelope.is_signed_by(s.identity());
                if already {
                    debug!(signer = %s.identity(), "[qc-channel-config] Signer already present, skipping");
                }
                !already
            })
            .collect();

        let signatures = if self.concurrent {
            try_join_all(pending.iter().map(|s| sign_one(*s, &signing_bytes))).await?
        } else {
            let mut out = Vec::with_capacity(pending.len());
            for signer in &pending {
                out.push(sign_one(*signer, &signing_bytes).await?);
            }
            out
        };

        metrics::record_signatures_collected(signatures.len() as u64);
        debug!(
            tx_id = %envelope.header.tx_id,
            collected = signatures.len(),
            "[qc-channel-config] Collected co-signatures"
        );
        envelope.signatures.extend(signatures);
        Ok(envelope)
    }
}

async fn sign_one(signer: &dyn ConfigSigner, bytes: &[u8]) -> ConfigUpdateResult<ConfigSignature> {
    match signer.sign(bytes).await {
        Ok(signature) => Ok(ConfigSignature {
            signer: signer.identity().clone(),
            signature,
        }),
        Err(e) => {
            warn!(signer = %signer.identity(), error = %e, "[qc-channel-config] Signer unavailable");
            Err(ConfigUpdateError::SigningUnavailable {
                signer: signer.identity().to_string(),
                reason: e.to_string(),
            })
        }
    }
}
