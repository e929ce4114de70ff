//! Task records and the lifecycle state machine.
//!
//! A task is a unit of assignable work tracked from draft or direct
//! assignment through implementation, submission, review, and completion.
//! Transitions are validated by a pure state machine over the task record;
//! exclusivity during implementation is enforced by the [`crate::lease`]
//! context. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
