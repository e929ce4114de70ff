//! Repository port for task request persistence and lookup.

use crate::intake::domain::{TaskRequest, TaskRequestId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task request repository operations.
pub type TaskRequestRepositoryResult<T> = Result<T, TaskRequestRepositoryError>;

/// Task request persistence contract.
#[async_trait]
pub trait TaskRequestRepository: Send + Sync {
    /// Stores a new task request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRequestRepositoryError::DuplicateRequest`] when the
    /// request ID already exists.
    async fn store(&self, request: &TaskRequest) -> TaskRequestRepositoryResult<()>;

    /// Persists changes to an existing request, conditional on the stored
    /// version matching the version the caller read.
    ///
    /// Returns the persisted record carrying the bumped version.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRequestRepositoryError::NotFound`] when the request
    /// does not exist and [`TaskRequestRepositoryError::VersionConflict`]
    /// when another writer got there first.
    async fn update(&self, request: &TaskRequest) -> TaskRequestRepositoryResult<TaskRequest>;

    /// Finds a request by identifier.
    ///
    /// Returns `None` when the request does not exist.
    async fn find_by_id(&self, id: TaskRequestId)
    -> TaskRequestRepositoryResult<Option<TaskRequest>>;

    /// Returns the pending requests, oldest first.
    async fn list_pending(&self) -> TaskRequestRepositoryResult<Vec<TaskRequest>>;
}

/// Errors returned by task request repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRequestRepositoryError {
    /// A request with the same identifier already exists.
    #[error("duplicate task request identifier: {0}")]
    DuplicateRequest(TaskRequestId),

    /// The request was not found.
    #[error("task request not found: {0}")]
    NotFound(TaskRequestId),

    /// The stored version does not match the version the caller read.
    #[error("version conflict on task request {request_id}: read {read}, stored {stored}")]
    VersionConflict {
        /// Request the update targeted.
        request_id: TaskRequestId,
        /// Version the caller based its edit on.
        read: u64,
        /// Version currently stored.
        stored: u64,
    },

    /// The store round-trip exceeded the configured deadline.
    #[error("task request store timed out")]
    Timeout,

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRequestRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
