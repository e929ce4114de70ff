//! Actor identity types shared across bounded contexts.
//!
//! Two roles exist: workers hold leases and submit work, coordinators
//! decide proposals and approve or reject submissions. Both identifiers
//! are opaque strings validated only for non-emptiness.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors returned while constructing actor identifiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActorError {
    /// The worker identifier is empty after trimming.
    #[error("worker identifier must not be empty")]
    EmptyWorkerId,

    /// The coordinator identifier is empty after trimming.
    #[error("coordinator identifier must not be empty")]
    EmptyCoordinatorId,
}

/// Identifier of a worker: the role that holds leases and submits work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    /// Creates a validated worker identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::EmptyWorkerId`] when the value is empty after
    /// trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ActorError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ActorError::EmptyWorkerId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for WorkerId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a coordinator: the role that decides proposals and
/// approves or rejects submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinatorId(String);

impl CoordinatorId {
    /// Creates a validated coordinator identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::EmptyCoordinatorId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ActorError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ActorError::EmptyCoordinatorId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CoordinatorId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CoordinatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{ActorError, CoordinatorId, WorkerId};

    #[test]
    fn worker_id_trims_surrounding_whitespace() {
        let id = WorkerId::new("  w1  ");
        assert_eq!(id.map(|w| w.as_str().to_owned()), Ok("w1".to_owned()));
    }

    #[test]
    fn worker_id_rejects_empty_input() {
        assert_eq!(WorkerId::new("   "), Err(ActorError::EmptyWorkerId));
    }

    #[test]
    fn coordinator_id_rejects_empty_input() {
        assert_eq!(
            CoordinatorId::new(""),
            Err(ActorError::EmptyCoordinatorId)
        );
    }
}
