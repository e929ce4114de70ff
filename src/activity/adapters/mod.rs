//! Adapter implementations for the activity log ports.

pub mod memory;
