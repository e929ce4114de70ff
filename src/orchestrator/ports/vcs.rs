//! Version-control provider port.
//!
//! The provider's internal behaviour is opaque to the engine: the
//! orchestrator invokes it on `start` (branch creation) and on completion
//! (merge) and treats any failure as a surfaced error.

use crate::review::domain::SubmissionId;
use crate::task::domain::{TaskId, WorkTarget};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;
use thiserror::Error;

/// Result type for version-control operations.
pub type VcsHostResult<T> = Result<T, VcsHostError>;

/// Version-control provider contract.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VcsHost: Send + Sync {
    /// Creates a working branch for a task in the target repository.
    ///
    /// # Errors
    ///
    /// Returns [`VcsHostError`] when the provider rejects the request.
    async fn create_branch(&self, target: &WorkTarget, task_id: TaskId) -> VcsHostResult<()>;

    /// Merges the submission in the provider.
    ///
    /// # Errors
    ///
    /// Returns [`VcsHostError`] when the provider rejects the request.
    async fn merge(&self, submission_id: SubmissionId) -> VcsHostResult<()>;
}

/// Errors returned by version-control provider implementations.
#[derive(Debug, Clone, Error)]
pub enum VcsHostError {
    /// The provider rejected the request.
    #[error("version-control provider rejected the request: {0}")]
    Rejected(String),

    /// The provider could not be reached.
    #[error("version-control provider unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl VcsHostError {
    /// Wraps a transport-level failure.
    #[must_use]
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
