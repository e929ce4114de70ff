//! Task request aggregate root and its approval workflow.

use super::{IntakeDomainError, ParseRequestStatusError, TaskRequestId};
use crate::actor::WorkerId;
use crate::task::domain::{Complexity, TaskTitle, WorkTarget};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decision state of a task request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting a coordinator decision.
    Pending,
    /// Approved and converted into a task.
    Approved,
    /// Rejected with explanatory notes.
    Rejected,
}

impl RequestStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for RequestStatus {
    type Error = ParseRequestStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseRequestStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for proposing a new task request.
#[derive(Debug, Clone)]
pub struct NewTaskRequest {
    /// Worker proposing the work.
    pub proposer: WorkerId,
    /// Proposed task title.
    pub title: TaskTitle,
    /// Free-form description of the work.
    pub description: String,
    /// Why the work is worth doing.
    pub justification: String,
    /// Proposer's size estimate.
    pub size_estimate: Complexity,
    /// Optional repository and branch the work would land in.
    pub target: Option<WorkTarget>,
}

impl NewTaskRequest {
    /// Creates request parameters with a medium size estimate and no target.
    #[must_use]
    pub fn new(
        proposer: WorkerId,
        title: TaskTitle,
        description: impl Into<String>,
        justification: impl Into<String>,
    ) -> Self {
        Self {
            proposer,
            title,
            description: description.into(),
            justification: justification.into(),
            size_estimate: Complexity::default(),
            target: None,
        }
    }

    /// Sets the size estimate.
    #[must_use]
    pub const fn with_size_estimate(mut self, size_estimate: Complexity) -> Self {
        self.size_estimate = size_estimate;
        self
    }

    /// Sets the work target.
    #[must_use]
    pub fn with_target(mut self, target: WorkTarget) -> Self {
        self.target = Some(target);
        self
    }
}

/// Task request aggregate root: a worker's proposal for new work, decided
/// exactly once by a coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    id: TaskRequestId,
    proposer: WorkerId,
    title: TaskTitle,
    description: String,
    justification: String,
    size_estimate: Complexity,
    target: Option<WorkTarget>,
    status: RequestStatus,
    notes: Option<String>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRequest {
    /// Creates a new pending request.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeDomainError::EmptyJustification`] when the
    /// justification is blank.
    pub fn new(params: NewTaskRequest, clock: &impl Clock) -> Result<Self, IntakeDomainError> {
        let justification = params.justification.trim().to_owned();
        if justification.is_empty() {
            return Err(IntakeDomainError::EmptyJustification);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskRequestId::new(),
            proposer: params.proposer,
            title: params.title,
            description: params.description,
            justification,
            size_estimate: params.size_estimate,
            target: params.target,
            status: RequestStatus::Pending,
            notes: None,
            version: 1,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn id(&self) -> TaskRequestId {
        self.id
    }

    /// Returns the proposing worker.
    #[must_use]
    pub const fn proposer(&self) -> &WorkerId {
        &self.proposer
    }

    /// Returns the proposed title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the justification.
    #[must_use]
    pub fn justification(&self) -> &str {
        &self.justification
    }

    /// Returns the proposer's size estimate.
    #[must_use]
    pub const fn size_estimate(&self) -> Complexity {
        self.size_estimate
    }

    /// Returns the proposed work target, when one was given.
    #[must_use]
    pub const fn target(&self) -> Option<&WorkTarget> {
        self.target.as_ref()
    }

    /// Returns the decision status.
    #[must_use]
    pub const fn status(&self) -> RequestStatus {
        self.status
    }

    /// Returns the coordinator's decision notes, when any were recorded.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the optimistic-lock version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Approves the request, optionally recording decision notes.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeDomainError::AlreadyDecided`] unless the request is
    /// pending.
    pub fn approve(
        &mut self,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), IntakeDomainError> {
        self.ensure_pending()?;
        self.status = RequestStatus::Approved;
        self.notes = notes.map(|value| value.trim().to_owned()).filter(|value| !value.is_empty());
        self.touch(clock);
        Ok(())
    }

    /// Rejects the request with explanatory notes.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeDomainError::AlreadyDecided`] unless the request is
    /// pending, and [`IntakeDomainError::EmptyDecisionNotes`] when the
    /// notes are blank.
    pub fn reject(
        &mut self,
        notes: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), IntakeDomainError> {
        self.ensure_pending()?;
        let trimmed = notes.into().trim().to_owned();
        if trimmed.is_empty() {
            return Err(IntakeDomainError::EmptyDecisionNotes);
        }
        self.status = RequestStatus::Rejected;
        self.notes = Some(trimmed);
        self.touch(clock);
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), IntakeDomainError> {
        if self.status == RequestStatus::Pending {
            return Ok(());
        }
        Err(IntakeDomainError::AlreadyDecided {
            request_id: self.id,
            status: self.status,
        })
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }

    /// Bumps the optimistic-lock version. Reserved for repository adapters.
    pub(crate) const fn bump_version(&mut self) {
        self.version += 1;
    }
}
