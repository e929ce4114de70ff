//! Foreman: task-lease orchestration engine.
//!
//! This crate governs how a unit of work moves from proposal through
//! exclusive assignment, implementation, review, and completion, while
//! guaranteeing that at most one worker actively holds a task at a time
//! and that state transitions are gated by verifiable conditions
//! (passing checks, explicit approval).
//!
//! # Architecture
//!
//! Foreman follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory store,
//!   recording collaborators for tests)
//!
//! # Modules
//!
//! - [`activity`]: Append-only event log, the source of historical truth
//! - [`lease`]: Time-boxed exclusive claims on tasks
//! - [`task`]: Task records and the lifecycle state machine
//! - [`review`]: Submissions, check aggregation, and the completion gate
//! - [`intake`]: Worker-proposed task requests and coordinator decisions
//! - [`orchestrator`]: Facade combining the above into the public surface

pub mod activity;
pub mod actor;
pub mod intake;
pub mod lease;
pub mod orchestrator;
pub mod review;
pub mod task;
