//! Append-only log port for activity event persistence and queries.

use crate::activity::domain::ActivityEvent;
use crate::task::domain::TaskId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for activity log operations.
pub type ActivityLogResult<T> = Result<T, ActivityLogError>;

/// Activity event persistence contract.
///
/// The log is append-only: implementations must never mutate or delete
/// stored events, and must preserve per-task insertion order.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Appends an event to the log.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityLogError`] when the underlying store rejects the
    /// append.
    async fn append(&self, event: &ActivityEvent) -> ActivityLogResult<()>;

    /// Returns all events referencing the given task, in append order.
    async fn for_task(&self, task_id: TaskId) -> ActivityLogResult<Vec<ActivityEvent>>;

    /// Returns all events recorded inside the half-open range `[from, to)`,
    /// in append order.
    async fn in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ActivityLogResult<Vec<ActivityEvent>>;
}

/// Errors returned by activity log implementations.
#[derive(Debug, Clone, Error)]
pub enum ActivityLogError {
    /// The store round-trip exceeded the configured deadline.
    #[error("activity log store timed out")]
    Timeout,

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ActivityLogError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
