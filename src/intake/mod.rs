//! Worker-proposed task requests and coordinator decisions.
//!
//! A task request is a worker-originated proposal for a new task. A
//! coordinator decides it exactly once: approval yields exactly one task
//! (assigned to the proposer unless the coordinator names someone else),
//! rejection requires explanatory notes. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
