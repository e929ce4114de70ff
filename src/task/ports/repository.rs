//! Repository port for task persistence, lookup, and listing.

use crate::actor::WorkerId;
use crate::task::domain::{Task, TaskId, TaskState};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Listing filter for task queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Restrict results to tasks in this state.
    pub state: Option<TaskState>,
    /// Restrict results to tasks assigned to this worker.
    pub assignee: Option<WorkerId>,
}

impl TaskFilter {
    /// Returns whether a task matches the filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let state_matches = self.state.is_none_or(|state| task.state() == state);
        let assignee_matches = self
            .assignee
            .as_ref()
            .is_none_or(|worker| task.assignee() == Some(worker));
        state_matches && assignee_matches
    }
}

/// Task persistence contract.
///
/// `update` carries compare-and-swap semantics on the task's version field
/// so that two concurrent read-modify-write sequences against the same task
/// cannot both succeed.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID
    /// already exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task, conditional on the stored
    /// version matching the version the caller read.
    ///
    /// Returns the persisted record carrying the bumped version.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist and [`TaskRepositoryError::VersionConflict`] when another
    /// writer got there first.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<Task>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns all tasks matching the filter, ordered by creation time.
    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>>;

    /// Removes a task record.
    ///
    /// Lifecycle gating (never delete once work has begun) is enforced by
    /// the caller; the repository removes unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn remove(&self, id: TaskId) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored version does not match the version the caller read.
    #[error("version conflict on task {task_id}: read {read}, stored {stored}")]
    VersionConflict {
        /// Task the update targeted.
        task_id: TaskId,
        /// Version the caller based its edit on.
        read: u64,
        /// Version currently stored.
        stored: u64,
    },

    /// The store round-trip exceeded the configured deadline.
    #[error("task store timed out")]
    Timeout,

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
