//! Error taxonomy for orchestrator operations.
//!
//! Every variant carries enough structured detail (entity id, current
//! status, attempted transition) for the calling layer to render an
//! actionable message without re-querying state.

use crate::activity::ports::ActivityLogError;
use crate::actor::WorkerId;
use crate::intake::domain::{IntakeDomainError, RequestStatus, TaskRequestId};
use crate::intake::ports::TaskRequestRepositoryError;
use crate::lease::domain::{LeaseDomainError, LeaseId, LeaseStatus};
use crate::lease::ports::LeaseRepositoryError;
use crate::lease::services::LeaseManagerError;
use crate::orchestrator::ports::VcsHostError;
use crate::review::domain::{ReviewDomainError, SubmissionId};
use crate::review::ports::SubmissionRepositoryError;
use crate::task::domain::{TaskDomainError, TaskId};
use crate::task::ports::TaskRepositoryError;
use std::sync::Arc;
use thiserror::Error;

/// Result type for orchestrator operations.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// Errors surfaced by the orchestration service.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// The task cannot be assigned because a non-released lease exists.
    #[error("task {task_id} is already assigned: lease held by {holder}")]
    AlreadyAssigned {
        /// Task the assignment targeted.
        task_id: TaskId,
        /// Worker holding the unreleased lease.
        holder: WorkerId,
    },

    /// A live lease already exists for the task.
    #[error("task {task_id} is already leased by {holder}")]
    LeaseConflict {
        /// Task the grant targeted.
        task_id: TaskId,
        /// Worker holding the existing lease.
        holder: WorkerId,
    },

    /// The operation requires a live lease and it has expired.
    #[error("lease {lease_id} on task {task_id} has expired")]
    LeaseExpired {
        /// Task the operation targeted.
        task_id: TaskId,
        /// The expired lease.
        lease_id: LeaseId,
    },

    /// The lease is not in a status that permits the operation.
    #[error("lease {lease_id} is not active (status {status})")]
    LeaseNotActive {
        /// Lease the operation targeted.
        lease_id: LeaseId,
        /// Effective status at the time of the attempt.
        status: LeaseStatus,
    },

    /// The task lifecycle forbids the requested transition.
    #[error(transparent)]
    InvalidTransition(TaskDomainError),

    /// The submission forbids the requested review action.
    #[error(transparent)]
    NotReviewable(ReviewDomainError),

    /// The task request was already approved or rejected.
    #[error("task request {request_id} was already decided: {status}")]
    AlreadyDecided {
        /// Request the decision was attempted against.
        request_id: TaskRequestId,
        /// Status the earlier decision left the request in.
        status: RequestStatus,
    },

    /// A store round-trip exceeded the configured deadline.
    #[error("store round-trip timed out")]
    StoreTimeout,

    /// An optimistic-lock update lost to a concurrent writer.
    #[error("store conflict: {0}")]
    StoreConflict(String),

    /// Caller-supplied input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The lease was not found.
    #[error("lease not found: {0}")]
    LeaseNotFound(LeaseId),

    /// The submission was not found.
    #[error("submission not found: {0}")]
    SubmissionNotFound(SubmissionId),

    /// The task request was not found.
    #[error("task request not found: {0}")]
    RequestNotFound(TaskRequestId),

    /// The version-control provider failed.
    #[error(transparent)]
    Vcs(#[from] VcsHostError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Store(Arc<dyn std::error::Error + Send + Sync>),
}

impl From<TaskDomainError> for OrchestrationError {
    fn from(err: TaskDomainError) -> Self {
        match err {
            TaskDomainError::InvalidStateTransition { .. } | TaskDomainError::NotDeletable { .. } => {
                Self::InvalidTransition(err)
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<ReviewDomainError> for OrchestrationError {
    fn from(err: ReviewDomainError) -> Self {
        match err {
            ReviewDomainError::NotReviewable { .. } | ReviewDomainError::GateNotSatisfied { .. } => {
                Self::NotReviewable(err)
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<IntakeDomainError> for OrchestrationError {
    fn from(err: IntakeDomainError) -> Self {
        match err {
            IntakeDomainError::AlreadyDecided { request_id, status } => Self::AlreadyDecided {
                request_id,
                status,
            },
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<LeaseManagerError> for OrchestrationError {
    fn from(err: LeaseManagerError) -> Self {
        match err {
            LeaseManagerError::Conflict { task_id, holder } => Self::LeaseConflict { task_id, holder },
            LeaseManagerError::NotFound(lease_id) => Self::LeaseNotFound(lease_id),
            LeaseManagerError::Domain(LeaseDomainError::NotActive { lease_id, status }) => {
                Self::LeaseNotActive { lease_id, status }
            }
            LeaseManagerError::Domain(other) => Self::Validation(other.to_string()),
            LeaseManagerError::Repository(repo) => repo.into(),
            LeaseManagerError::Log(log) => log.into(),
        }
    }
}

impl From<TaskRepositoryError> for OrchestrationError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(task_id) => Self::TaskNotFound(task_id),
            TaskRepositoryError::Timeout => Self::StoreTimeout,
            TaskRepositoryError::Persistence(source) => Self::Store(source),
            conflict @ (TaskRepositoryError::DuplicateTask(_)
            | TaskRepositoryError::VersionConflict { .. }) => {
                Self::StoreConflict(conflict.to_string())
            }
        }
    }
}

impl From<LeaseRepositoryError> for OrchestrationError {
    fn from(err: LeaseRepositoryError) -> Self {
        match err {
            LeaseRepositoryError::NotFound(lease_id) => Self::LeaseNotFound(lease_id),
            LeaseRepositoryError::Timeout => Self::StoreTimeout,
            LeaseRepositoryError::Persistence(source) => Self::Store(source),
            conflict @ (LeaseRepositoryError::DuplicateLease(_)
            | LeaseRepositoryError::ActiveLeaseExists(_)
            | LeaseRepositoryError::VersionConflict { .. }) => {
                Self::StoreConflict(conflict.to_string())
            }
        }
    }
}

impl From<SubmissionRepositoryError> for OrchestrationError {
    fn from(err: SubmissionRepositoryError) -> Self {
        match err {
            SubmissionRepositoryError::NotFound(submission_id) => {
                Self::SubmissionNotFound(submission_id)
            }
            SubmissionRepositoryError::Timeout => Self::StoreTimeout,
            SubmissionRepositoryError::Persistence(source) => Self::Store(source),
            conflict @ (SubmissionRepositoryError::DuplicateSubmission(_)
            | SubmissionRepositoryError::VersionConflict { .. }) => {
                Self::StoreConflict(conflict.to_string())
            }
        }
    }
}

impl From<TaskRequestRepositoryError> for OrchestrationError {
    fn from(err: TaskRequestRepositoryError) -> Self {
        match err {
            TaskRequestRepositoryError::NotFound(request_id) => Self::RequestNotFound(request_id),
            TaskRequestRepositoryError::Timeout => Self::StoreTimeout,
            TaskRequestRepositoryError::Persistence(source) => Self::Store(source),
            conflict @ (TaskRequestRepositoryError::DuplicateRequest(_)
            | TaskRequestRepositoryError::VersionConflict { .. }) => {
                Self::StoreConflict(conflict.to_string())
            }
        }
    }
}

impl From<ActivityLogError> for OrchestrationError {
    fn from(err: ActivityLogError) -> Self {
        match err {
            ActivityLogError::Timeout => Self::StoreTimeout,
            ActivityLogError::Persistence(source) => Self::Store(source),
        }
    }
}

impl OrchestrationError {
    /// Returns whether the error is an optimistic-lock conflict the caller
    /// may retry with the same input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreConflict(_))
    }
}
