//! Orchestrator facade: the public surface of the engine.
//!
//! The orchestration service wraps the task store, lease manager, review
//! gate, and request intake behind one set of operations. After every
//! successful mutation it appends exactly one activity event and then
//! notifies subscribed observers (best-effort; observer failure never
//! rolls back the mutation). The module follows hexagonal architecture:
//!
//! - Port contracts for external collaborators in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The orchestration service in [`services`]

mod error;

pub mod adapters;
pub mod ports;
pub mod services;

pub use error::{OrchestrationError, OrchestrationResult};

#[cfg(test)]
mod tests;
