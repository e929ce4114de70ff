//! Error types for task domain validation and parsing.

use super::{TaskId, TaskState};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The requested lifecycle transition is not permitted.
    #[error("invalid state transition for task {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Task the transition was attempted against.
        task_id: TaskId,
        /// State the task was in.
        from: TaskState,
        /// State the transition targeted.
        to: TaskState,
    },

    /// The task cannot be deleted in its current state.
    #[error("task {task_id} cannot be deleted in state {state} (lease held: {lease_held})")]
    NotDeletable {
        /// Task the deletion was attempted against.
        task_id: TaskId,
        /// Current lifecycle state.
        state: TaskState,
        /// Whether a lease has ever been granted for the task.
        lease_held: bool,
    },

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the storage length limit.
    #[error("task title exceeds {0} characters")]
    TitleTooLong(usize),

    /// The target repository reference is empty after trimming.
    #[error("target repository must not be empty")]
    EmptyTargetRepository,

    /// The target branch reference is empty after trimming.
    #[error("target branch must not be empty")]
    EmptyTargetBranch,

    /// The priority value is unsupported.
    #[error("unknown priority: {0}")]
    InvalidPriority(String),

    /// The complexity value is unsupported.
    #[error("unknown complexity: {0}")]
    InvalidComplexity(String),
}

/// Error returned while parsing task states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task state: {0}")]
pub struct ParseTaskStateError(pub String);
