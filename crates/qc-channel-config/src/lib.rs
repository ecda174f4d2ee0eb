//! # qc-channel-config
//!
//! Governed configuration updates for a namespace (channel) whose
//! configuration lives on the ledger as a versioned tree.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **ConfigTree**: nested groups, values and policies, each versioned
//! - **DiffEngine**: minimal read-set/write-set update between two trees
//! - **MetadataMutator**: targeted edits of an encoded sub-document (consenters)
//! - **Envelope + SignatureCollector**: signed `CONFIG_UPDATE` envelopes, co-signed in order
//! - **SubmissionClient + CommitWatcher**: submit with retry, confirm by version
//!
//! ## Architecture
//!
//! ```text
//! ChannelConfigService
//!   │  fetch ──────────────► LedgerQuery
//!   │  compute_update
//!   │  UpdateEnvelopeBuilder ─► ConfigSigner (primary)
//!   │  SignatureCollector ───► ConfigSigner (co-signers)
//!   │  SubmissionClient ─────► OrderingService
//!   └  CommitWatcher ────────► LedgerQuery (version polling)
//! ```
//!
//! ## Concurrency
//!
//! There is no locking on the client side. The ordering side checks every
//! read-set version against the committed tree, so of several updates
//! computed from the same snapshot the first one to be ordered commits and
//! the rest fail with `RejectedStale`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_channel_config::{ChannelConfigService, ChannelConfigSettings, Consenter};
//! use qc_channel_config::ports::inbound::ChannelConfigApi;
//!
//! let service = ChannelConfigService::new(ledger, ordering, admin, ChannelConfigSettings::from_env())?;
//!
//! let outcome = service
//!     .add_consenter(&namespace, Consenter::new("orderer4", 7050, client_cert, server_cert), &co_signers)
//!     .await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod submission;
pub mod watcher;

pub use adapters::{InMemoryLedger, LocalSigner};
pub use config::ChannelConfigSettings;
pub use domain::{
    compute_update, edit_consensus_metadata, edit_value, validate_and_apply, ConfigGroup,
    ConfigPath, ConfigPolicy, ConfigTree, ConfigUpdate, ConfigValue, ConsensusMetadataMutation,
    ConsensusType, Consenter, MetadataMutator, Policy, RaftMetadata, SignatureCollector,
    UpdateEnvelopeBuilder, ValueAddress,
};
pub use error::{ConfigUpdateError, ConfigUpdateResult};
pub use ports::{ChannelConfigApi, ConfigSigner, LedgerQuery, OrderingService, UpdateOutcome};
pub use service::ChannelConfigService;
pub use submission::{RetryPolicy, SubmissionClient};
pub use watcher::CommitWatcher;
