//! Repository port for submission persistence and lookup.

use crate::review::domain::{Submission, SubmissionId};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for submission repository operations.
pub type SubmissionRepositoryResult<T> = Result<T, SubmissionRepositoryError>;

/// Submission persistence contract.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Stores a new submission.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionRepositoryError::DuplicateSubmission`] when the
    /// submission ID already exists.
    async fn store(&self, submission: &Submission) -> SubmissionRepositoryResult<()>;

    /// Persists changes to an existing submission, conditional on the
    /// stored version matching the version the caller read.
    ///
    /// Returns the persisted record carrying the bumped version.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionRepositoryError::NotFound`] when the submission
    /// does not exist and [`SubmissionRepositoryError::VersionConflict`]
    /// when another writer got there first.
    async fn update(&self, submission: &Submission) -> SubmissionRepositoryResult<Submission>;

    /// Finds a submission by identifier.
    ///
    /// Returns `None` when the submission does not exist.
    async fn find_by_id(&self, id: SubmissionId) -> SubmissionRepositoryResult<Option<Submission>>;

    /// Returns the non-terminal submission for the given task, if any.
    async fn find_open_for_task(
        &self,
        task_id: TaskId,
    ) -> SubmissionRepositoryResult<Option<Submission>>;
}

/// Errors returned by submission repository implementations.
#[derive(Debug, Clone, Error)]
pub enum SubmissionRepositoryError {
    /// A submission with the same identifier already exists.
    #[error("duplicate submission identifier: {0}")]
    DuplicateSubmission(SubmissionId),

    /// The submission was not found.
    #[error("submission not found: {0}")]
    NotFound(SubmissionId),

    /// The stored version does not match the version the caller read.
    #[error("version conflict on submission {submission_id}: read {read}, stored {stored}")]
    VersionConflict {
        /// Submission the update targeted.
        submission_id: SubmissionId,
        /// Version the caller based its edit on.
        read: u64,
        /// Version currently stored.
        stored: u64,
    },

    /// The store round-trip exceeded the configured deadline.
    #[error("submission store timed out")]
    Timeout,

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SubmissionRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
