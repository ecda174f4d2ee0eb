//! Domain layer: the configuration model and the pure parts of the update protocol.

pub mod apply;
pub mod consensus;
pub mod diff;
pub mod envelope;
pub mod mutator;
pub mod policy;
pub mod signatures;
pub mod tree;
pub mod update;

pub use apply::{validate_and_apply, AppliedUpdate, Authorization};
pub use consensus::{ConsensusState, ConsensusType, Consenter, RaftMetadata, RaftOptions};
pub use diff::compute_update;
pub use envelope::UpdateEnvelopeBuilder;
pub use mutator::{
    consenters, edit_consensus_metadata, edit_value, edit_value_with, ConsensusMetadataMutation,
    CustomMutation, MetadataMutator,
};
pub use policy::{ImplicitMetaRule, Policy, PolicyEvaluator, Principal, SignaturePolicy};
pub use signatures::SignatureCollector;
pub use tree::{
    names, ConfigElement, ConfigGroup, ConfigPath, ConfigPolicy, ConfigTree, ConfigValue,
    ValueAddress, ROOT_GROUP,
};
pub use update::{Change, ChangeKind, ConfigUpdate, ReadGroup, WriteEntry, WriteGroup};
