//! # Integration Flows
//!
//! Every test here goes through the public service API: fetch, edit,
//! compute the update, sign, co-sign, submit, and wait for the ledger to
//! report the new config version.

pub mod fixtures;

mod consenters;
mod delivery;
mod governance;
mod observability;
