//! Error types for intake domain validation and parsing.

use super::{RequestStatus, TaskRequestId};
use thiserror::Error;

/// Errors returned while constructing or deciding task requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntakeDomainError {
    /// The request justification is empty after trimming.
    #[error("a task request must carry a justification")]
    EmptyJustification,

    /// A rejection was attempted without explanatory notes.
    #[error("rejecting a task request requires non-empty notes")]
    EmptyDecisionNotes,

    /// The request has already been approved or rejected.
    #[error("task request {request_id} was already decided: {status}")]
    AlreadyDecided {
        /// Request the decision was attempted against.
        request_id: TaskRequestId,
        /// Status the earlier decision left the request in.
        status: RequestStatus,
    },
}

/// Error returned while parsing request statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown request status: {0}")]
pub struct ParseRequestStatusError(pub String);
