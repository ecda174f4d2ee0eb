//! # Shared Crypto - Signing Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Config update signatures, identity keys |
//! | `hashing` | SHA-256 | Update digests, transaction ids, test key derivation |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **Strict verification**: Rejects malleable signatures and small-order keys

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_parts, Digest256};
pub use signatures::{verify_detached, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
