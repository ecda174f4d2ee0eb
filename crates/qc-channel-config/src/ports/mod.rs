//! Ports module for the Channel Configuration subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::{ChannelConfigApi, UpdateOutcome};
pub use outbound::{ConfigSigner, LedgerQuery, OrderingService, SigningError, SubmitAck};
