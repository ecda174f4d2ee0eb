//! # Channel Config Test Suite
//!
//! End-to-end flows that drive `ChannelConfigService` against the in-memory
//! ledger, plus a criterion benchmark for the diff engine.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── config_diff.rs      # compute_update over large trees
//! └── src/
//!     └── integration/
//!         ├── fixtures.rs     # genesis trees, signers, fast settings
//!         ├── consenters.rs   # add/remove consenter round trips
//!         ├── governance.rs   # policy rejection and co-signing
//!         ├── delivery.rs     # stale races, transport retry, commit timeout
//!         └── observability.rs # prometheus counters after real flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

pub mod integration;
