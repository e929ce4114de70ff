//! Error types for lease domain validation and parsing.

use super::{LeaseId, LeaseStatus};
use thiserror::Error;

/// Errors returned while mutating domain lease values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LeaseDomainError {
    /// The lease cannot be extended in its current status.
    #[error("lease {lease_id} is not active (status {status})")]
    NotActive {
        /// Lease the extension was attempted against.
        lease_id: LeaseId,
        /// Effective status at the time of the attempt.
        status: LeaseStatus,
    },
    /// An extension must push the expiry forward.
    #[error("lease {lease_id} extension must be a positive duration")]
    NonPositiveExtension {
        /// Lease the extension was attempted against.
        lease_id: LeaseId,
    },
}

/// Error returned while parsing lease statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown lease status: {0}")]
pub struct ParseLeaseStatusError(pub String);
