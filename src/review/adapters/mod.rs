//! Adapter implementations for the review ports.

pub mod memory;
