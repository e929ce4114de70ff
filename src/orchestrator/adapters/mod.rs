//! Adapter implementations for the orchestrator ports.

pub mod recording;
