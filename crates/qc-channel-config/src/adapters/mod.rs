//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-process implementations of the outbound ports: a ledger that also acts
//! as the ordering service, and a local Ed25519 signing identity.

mod in_memory_ledger;
mod local_signer;

pub use in_memory_ledger::InMemoryLedger;
pub use local_signer::LocalSigner;
