//! Append-only activity log for Foreman.
//!
//! Every successful mutation against the engine appends exactly one
//! activity event here. The log is the only source of historical truth:
//! events are never mutated or deleted, and events for a given task are
//! retained in the order their causing operations completed. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
