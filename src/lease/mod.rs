//! Time-boxed exclusive claims on tasks.
//!
//! A lease is the mutual-exclusion primitive of the engine: exactly one
//! live lease may exist per task at any time. Expiry is detected lazily on
//! the next access and swept periodically, rather than via per-lease
//! timers, trading a small staleness window (bounded by the sweep
//! interval) for simplicity. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The lease manager service and sweep loop in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
