//! Adapter implementations for the lease ports.

pub mod memory;
