//! Submissions, check aggregation, and the completion gate.
//!
//! A submission is a worker's proposed completed artifact for a task. It
//! may merge only when every named check is true AND it has been
//! explicitly approved; approval and passing checks are independent and
//! both required, in either arrival order. The engine never decides check
//! outcomes itself; results are pushed in by an external check source.
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
