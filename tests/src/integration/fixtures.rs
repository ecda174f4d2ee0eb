//! Shared test fixtures: a two-org orderer channel and fast settings.

use qc_channel_config::domain::{names, ImplicitMetaRule};
use qc_channel_config::{
    ChannelConfigService, ChannelConfigSettings, ConfigGroup, ConfigPath, ConfigPolicy,
    ConfigSigner, ConfigTree, ConfigValue, ConsensusType, Consenter, InMemoryLedger, LocalSigner,
    Policy, RaftMetadata, ValueAddress,
};
use shared_types::{IdentityRole, NamespaceId};
use std::sync::Arc;
use std::time::Duration;

pub const CHANNEL: &str = "testchannel";
pub const ORG1: &str = "OrdererOrg1";
pub const ORG2: &str = "OrdererOrg2";

pub type TestService = ChannelConfigService<InMemoryLedger, InMemoryLedger>;

pub fn namespace() -> NamespaceId {
    NamespaceId::new(CHANNEL).expect("valid channel name")
}

/// Consenter whose certificates are derived from its name.
pub fn consenter(name: &str) -> Consenter {
    Consenter::new(
        format!("{}.example.com", name),
        7050,
        client_cert(name),
        format!("{}-server-cert", name).into_bytes(),
    )
}

pub fn client_cert(name: &str) -> Vec<u8> {
    format!("{}-client-cert", name).into_bytes()
}

fn org(name: &str) -> ConfigGroup {
    ConfigGroup::new(names::ADMINS_POLICY).with_policy(
        names::ADMINS_POLICY,
        ConfigPolicy::new(Policy::one_of(name, IdentityRole::Admin), names::ADMINS_POLICY),
    )
}

/// Orderer group governed by a MAJORITY of two orgs' admins, so every
/// orderer change needs both of them.
pub fn genesis(consenter_names: &[&str]) -> ConfigTree {
    let metadata = RaftMetadata::new(consenter_names.iter().map(|n| consenter(n)).collect());
    let consensus = ConsensusType::new(
        "etcdraft",
        metadata.to_bytes().expect("raft metadata encodes"),
    );
    let orderer = ConfigGroup::new(names::ADMINS_POLICY)
        .with_value(
            names::CONSENSUS_TYPE_KEY,
            ConfigValue::new(
                consensus.to_bytes().expect("consensus type encodes"),
                names::ADMINS_POLICY,
            ),
        )
        .with_value(
            names::BATCH_SIZE_KEY,
            ConfigValue::new(b"10".to_vec(), names::ADMINS_POLICY),
        )
        .with_policy(
            names::ADMINS_POLICY,
            ConfigPolicy::new(
                Policy::implicit_meta(names::ADMINS_POLICY, ImplicitMetaRule::Majority),
                names::ADMINS_POLICY,
            ),
        )
        .with_group(ORG1, org(ORG1))
        .with_group(ORG2, org(ORG2));
    let root = ConfigGroup::new(names::ADMINS_POLICY)
        .with_policy(
            names::ADMINS_POLICY,
            ConfigPolicy::new(
                Policy::implicit_meta(names::ADMINS_POLICY, ImplicitMetaRule::Majority),
                names::ADMINS_POLICY,
            ),
        )
        .with_group(names::ORDERER_GROUP, orderer);
    ConfigTree::new(namespace(), root)
}

pub fn admin(org: &str) -> LocalSigner {
    LocalSigner::from_label(org, IdentityRole::Admin, "admin")
}

pub fn peer(org: &str) -> LocalSigner {
    LocalSigner::from_label(org, IdentityRole::Member, "peer0")
}

/// Ledger seeded with `genesis`, with both orgs' admins and peers enrolled.
pub fn enrolled_ledger(consenter_names: &[&str]) -> Arc<InMemoryLedger> {
    let signers = [admin(ORG1), admin(ORG2), peer(ORG1), peer(ORG2)];
    let ledger = InMemoryLedger::with_genesis(genesis(consenter_names))
        .with_members(signers.iter().map(|s| s.identity()));
    Arc::new(ledger)
}

/// The second org's admin, as a co-signer list.
pub fn co_signers() -> Vec<Arc<dyn ConfigSigner>> {
    vec![Arc::new(admin(ORG2))]
}

pub fn batch_size() -> ValueAddress {
    ValueAddress::new(ConfigPath::new([names::ORDERER_GROUP]), names::BATCH_SIZE_KEY)
}

/// Copy of `tree` with the orderer batch size replaced.
pub fn with_batch_size(tree: &ConfigTree, batch: &str) -> ConfigTree {
    let mut next = tree.clone();
    if let Some(value) = next.value_mut(&batch_size()) {
        value.value = batch.as_bytes().to_vec();
    }
    next
}

pub fn fast_settings() -> ChannelConfigSettings {
    ChannelConfigSettings {
        poll_interval: Duration::from_millis(5),
        commit_timeout: Duration::from_secs(2),
        transport_backoff_initial: Duration::from_millis(1),
        transport_backoff_max: Duration::from_millis(4),
        ..Default::default()
    }
}

/// Service whose primary signer is the first org's admin.
pub fn service(ledger: &Arc<InMemoryLedger>, settings: ChannelConfigSettings) -> TestService {
    ChannelConfigService::new(
        Arc::clone(ledger),
        Arc::clone(ledger),
        Arc::new(admin(ORG1)),
        settings,
    )
    .expect("fixture settings are valid")
}
