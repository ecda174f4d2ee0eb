//! # Shared Types Crate
//!
//! This crate contains the entities exchanged between configuration
//! submitters, co-signers and the ordering service, together with the
//! canonical binary codec every participant uses to re-derive them.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-participant types are defined here.
//! - **Deterministic Encoding**: Every wire structure is encoded with
//!   [`codec::encode`], so two participants holding the same value produce the
//!   same bytes and can verify each other's signatures.
//! - **Envelope Authority**: The envelope header's `creator` is the submitting
//!   identity; co-signers are listed in `signatures` in the order they signed.

pub mod codec;
pub mod entities;
pub mod envelope;
pub mod errors;

pub use codec::{decode, encode, MAX_ENCODED_LEN};
pub use entities::*;
pub use envelope::{ConfigSignature, EnvelopeHeader, HeaderType, SignedEnvelope};
pub use errors::*;
