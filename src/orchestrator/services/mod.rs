//! Orchestration service wiring the bounded contexts together.

mod facade;

pub use facade::{OrchestrationDeps, OrchestrationService, RequestDecision};
