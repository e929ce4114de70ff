//! Adapter implementations for the intake ports.

pub mod memory;
