//! Error types for review domain validation and parsing.

use super::{SubmissionId, SubmissionStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating domain submission values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReviewDomainError {
    /// The changed-file list is empty.
    #[error("a submission must name at least one changed file")]
    EmptyChangedFiles,

    /// The check name is empty after trimming.
    #[error("check name must not be empty")]
    EmptyCheckName,

    /// The submission cannot accept the requested review action in its
    /// current status.
    #[error("submission {submission_id} cannot be reviewed in status {status}")]
    NotReviewable {
        /// Submission the action was attempted against.
        submission_id: SubmissionId,
        /// Current status.
        status: SubmissionStatus,
    },

    /// The submission does not satisfy the completion gate.
    #[error(
        "submission {submission_id} cannot merge: status {status}, all checks passing: {checks_passing}"
    )]
    GateNotSatisfied {
        /// Submission the merge was attempted against.
        submission_id: SubmissionId,
        /// Current status.
        status: SubmissionStatus,
        /// Whether every named check is currently true.
        checks_passing: bool,
    },
}

/// Error returned while parsing submission statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown submission status: {0}")]
pub struct ParseSubmissionStatusError(pub String);
