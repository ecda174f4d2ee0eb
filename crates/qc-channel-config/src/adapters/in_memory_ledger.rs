//! In-memory ledger and ordering service
//!
//! Holds the committed configuration of each namespace and orders config
//! update envelopes against it. Broadcasting validates the whole envelope
//! under the namespace write lock, so of two updates computed against the
//! same snapshot exactly one commits and the other is rejected as stale.
//!
//! Signer identities are only trusted when their public key is enrolled for
//! the org and role they claim. A valid signature from an unenrolled key
//! authorizes nothing.

use crate::domain::apply::validate_and_apply;
use crate::domain::policy::PolicyEvaluator;
use crate::domain::tree::ConfigTree;
use crate::domain::update::ConfigUpdate;
use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use crate::ports::outbound::{LedgerQuery, OrderingService, SubmitAck};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_crypto::verify_detached;
use shared_types::{
    BlockNumber, HeaderType, IdentityRole, NamespaceId, SerializedIdentity, SignedEnvelope,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info, warn};

struct NamespaceState {
    tree: ConfigTree,
    /// Block number of the latest config block.
    height: BlockNumber,
    committed_tx_ids: Vec<String>,
}

/// Ledger query port plus ordering port over in-process state.
#[derive(Default)]
pub struct InMemoryLedger {
    namespaces: RwLock<HashMap<NamespaceId, NamespaceState>>,
    /// org -> (role, public key) pairs accepted as that org's identities
    members: RwLock<HashMap<String, HashSet<(IdentityRole, Vec<u8>)>>>,
    failing_broadcasts: AtomicU32,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger seeded with one genesis configuration at block 0.
    pub fn with_genesis(tree: ConfigTree) -> Self {
        let ledger = Self::new();
        ledger.create_namespace(tree);
        ledger
    }

    /// Install a genesis configuration. Replaces any existing namespace state.
    pub fn create_namespace(&self, tree: ConfigTree) {
        info!(namespace = %tree.namespace, "[qc-channel-config] Namespace created");
        self.namespaces.write().insert(
            tree.namespace.clone(),
            NamespaceState {
                tree,
                height: 0,
                committed_tx_ids: Vec::new(),
            },
        );
    }

    /// Accept `identity`'s public key for its org and role.
    pub fn enroll(&self, identity: &SerializedIdentity) {
        debug!(identity = %identity, "[qc-channel-config] Identity enrolled");
        self.members
            .write()
            .entry(identity.org.clone())
            .or_default()
            .insert((identity.role, identity.public_key.clone()));
    }

    pub fn with_members<'a>(self, identities: impl IntoIterator<Item = &'a SerializedIdentity>) -> Self {
        for identity in identities {
            self.enroll(identity);
        }
        self
    }

    fn is_enrolled(&self, identity: &SerializedIdentity) -> bool {
        self.members
            .read()
            .get(&identity.org)
            .is_some_and(|keys| keys.contains(&(identity.role, identity.public_key.clone())))
    }

    /// Make the next `count` broadcasts fail with a transport error.
    pub fn fail_next_broadcasts(&self, count: u32) {
        self.failing_broadcasts.store(count, Ordering::SeqCst);
    }

    /// Committed tree, if the namespace exists.
    pub fn committed(&self, namespace: &NamespaceId) -> Option<ConfigTree> {
        self.namespaces.read().get(namespace).map(|s| s.tree.clone())
    }

    /// Transaction ids of committed updates, oldest first.
    pub fn committed_tx_ids(&self, namespace: &NamespaceId) -> Vec<String> {
        self.namespaces
            .read()
            .get(namespace)
            .map(|s| s.committed_tx_ids.clone())
            .unwrap_or_default()
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_broadcasts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Order and commit one envelope.
    fn order(&self, envelope: &SignedEnvelope) -> ConfigUpdateResult<SubmitAck> {
        let header = &envelope.header;
        if header.header_type != HeaderType::ConfigUpdate {
            return Err(ConfigUpdateError::malformed(
                "envelope",
                format!("expected a config update, got {:?}", header.header_type),
            ));
        }
        if !header.tx_id_is_consistent() {
            return Err(ConfigUpdateError::malformed("envelope", "tx_id does not match nonce and creator"));
        }

        let update = ConfigUpdate::from_bytes(&envelope.payload)?;
        if update.namespace != header.namespace {
            return Err(ConfigUpdateError::malformed(
                "envelope",
                format!(
                    "header targets '{}', payload targets '{}'",
                    header.namespace, update.namespace
                ),
            ));
        }
        if update.is_noop() {
            return Err(ConfigUpdateError::malformed("/Channel", "update contains no changes"));
        }

        let signers = self.verified_signers(envelope)?;

        let mut namespaces = self.namespaces.write();
        let state = namespaces
            .get_mut(&header.namespace)
            .ok_or_else(|| ConfigUpdateError::Ledger {
                reason: format!("unknown namespace '{}'", header.namespace),
            })?;

        let applied = validate_and_apply(&state.tree, &update)?;

        let evaluator = PolicyEvaluator::new(&state.tree).with_proposed(&applied.tree);
        for auth in &applied.authorizations {
            if !evaluator.evaluate(&auth.governing_group, &auth.policy, &signers) {
                return Err(ConfigUpdateError::RejectedByPolicy {
                    path: auth.element.clone(),
                    policy: auth.policy.clone(),
                });
            }
        }

        let mut tree = applied.tree;
        tree.sequence = state.tree.sequence + 1;
        state.tree = tree;
        state.height += 1;
        state.committed_tx_ids.push(header.tx_id.clone());

        info!(
            namespace = %header.namespace,
            sequence = state.tree.sequence,
            block = state.height,
            tx_id = %header.tx_id,
            "[qc-channel-config] ✅ Config update committed"
        );

        Ok(SubmitAck {
            tx_id: header.tx_id.clone(),
            namespace: header.namespace.clone(),
        })
    }
}

impl InMemoryLedger {
    /// Enrolled identities whose signatures verify over the envelope,
    /// deduplicated. Invalid signatures and unenrolled keys are ignored.
    fn verified_signers(&self, envelope: &SignedEnvelope) -> ConfigUpdateResult<Vec<SerializedIdentity>> {
        let signing_bytes = envelope
            .signing_bytes()
            .map_err(|e| ConfigUpdateError::serialization("SignedEnvelope", e))?;

        let mut signers: Vec<SerializedIdentity> = Vec::with_capacity(envelope.signatures.len());
        for sig in &envelope.signatures {
            if !self.is_enrolled(&sig.signer) {
                warn!(signer = %sig.signer, "[qc-channel-config] Ignoring signature from unenrolled identity");
                continue;
            }
            match verify_detached(&sig.signer.public_key, &signing_bytes, &sig.signature) {
                Ok(()) if !signers.contains(&sig.signer) => signers.push(sig.signer.clone()),
                Ok(()) => {}
                Err(e) => warn!(signer = %sig.signer, error = %e, "[qc-channel-config] Ignoring invalid signature"),
            }
        }
        Ok(signers)
    }
}

#[async_trait]
impl LedgerQuery for InMemoryLedger {
    async fn fetch_current_config(&self, namespace: &NamespaceId) -> ConfigUpdateResult<ConfigTree> {
        self.committed(namespace).ok_or_else(|| ConfigUpdateError::Ledger {
            reason: format!("unknown namespace '{}'", namespace),
        })
    }

    async fn fetch_current_version(&self, namespace: &NamespaceId) -> ConfigUpdateResult<BlockNumber> {
        self.namespaces
            .read()
            .get(namespace)
            .map(|s| s.height)
            .ok_or_else(|| ConfigUpdateError::Ledger {
                reason: format!("unknown namespace '{}'", namespace),
            })
    }
}

#[async_trait]
impl OrderingService for InMemoryLedger {
    async fn broadcast(&self, envelope: &SignedEnvelope) -> ConfigUpdateResult<SubmitAck> {
        if self.take_injected_failure() {
            debug!(tx_id = %envelope.header.tx_id, "[qc-channel-config] Injected transport failure");
            return Err(ConfigUpdateError::Transport {
                reason: "injected failure: ordering service unreachable".into(),
            });
        }
        self.order(envelope)
    }
}
