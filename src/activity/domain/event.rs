//! Immutable activity event record and event kind taxonomy.

use super::{ActivityEventId, ParseEventKindError};
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of state transition recorded by an activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A worker proposed a new task request.
    TaskProposed,
    /// A coordinator approved a task request.
    RequestApproved,
    /// A coordinator rejected a task request.
    RequestRejected,
    /// A coordinator created a task directly.
    TaskCreated,
    /// A task was assigned to a worker.
    TaskAssigned,
    /// A worker started a task and acquired its lease.
    TaskStarted,
    /// A worker submitted work artifacts against a task.
    WorkSubmitted,
    /// An external check result was reported against a submission.
    CheckReported,
    /// A coordinator approved a submission.
    SubmissionApproved,
    /// A coordinator requested changes on a submission.
    ChangesRequested,
    /// A task reached its terminal completed state.
    TaskCompleted,
    /// A task was reassigned to a different worker.
    TaskReassigned,
    /// A task record was deleted before work began.
    TaskDeleted,
    /// A lease expiry was pushed forward.
    LeaseExtended,
    /// A lease was explicitly released.
    LeaseReleased,
    /// The sweep flipped a lease past its expiry to expired.
    LeaseExpired,
}

impl EventKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskProposed => "task_proposed",
            Self::RequestApproved => "request_approved",
            Self::RequestRejected => "request_rejected",
            Self::TaskCreated => "task_created",
            Self::TaskAssigned => "task_assigned",
            Self::TaskStarted => "task_started",
            Self::WorkSubmitted => "work_submitted",
            Self::CheckReported => "check_reported",
            Self::SubmissionApproved => "submission_approved",
            Self::ChangesRequested => "changes_requested",
            Self::TaskCompleted => "task_completed",
            Self::TaskReassigned => "task_reassigned",
            Self::TaskDeleted => "task_deleted",
            Self::LeaseExtended => "lease_extended",
            Self::LeaseReleased => "lease_released",
            Self::LeaseExpired => "lease_expired",
        }
    }
}

impl TryFrom<&str> for EventKind {
    type Error = ParseEventKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "task_proposed" => Ok(Self::TaskProposed),
            "request_approved" => Ok(Self::RequestApproved),
            "request_rejected" => Ok(Self::RequestRejected),
            "task_created" => Ok(Self::TaskCreated),
            "task_assigned" => Ok(Self::TaskAssigned),
            "task_started" => Ok(Self::TaskStarted),
            "work_submitted" => Ok(Self::WorkSubmitted),
            "check_reported" => Ok(Self::CheckReported),
            "submission_approved" => Ok(Self::SubmissionApproved),
            "changes_requested" => Ok(Self::ChangesRequested),
            "task_completed" => Ok(Self::TaskCompleted),
            "task_reassigned" => Ok(Self::TaskReassigned),
            "task_deleted" => Ok(Self::TaskDeleted),
            "lease_extended" => Ok(Self::LeaseExtended),
            "lease_released" => Ok(Self::LeaseReleased),
            "lease_expired" => Ok(Self::LeaseExpired),
            _ => Err(ParseEventKindError(value.to_owned())),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of a single state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    id: ActivityEventId,
    recorded_at: DateTime<Utc>,
    kind: EventKind,
    task_id: Option<TaskId>,
    actor: String,
    metadata: serde_json::Value,
}

impl ActivityEvent {
    /// Creates a new event stamped with the current clock time.
    #[must_use]
    pub fn new(
        kind: EventKind,
        task_id: Option<TaskId>,
        actor: impl Into<String>,
        metadata: serde_json::Value,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: ActivityEventId::new(),
            recorded_at: clock.utc(),
            kind,
            task_id,
            actor: actor.into(),
            metadata,
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn id(&self) -> ActivityEventId {
        self.id
    }

    /// Returns the time the event was recorded.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the referenced task, if the event concerns one.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the actor that caused the transition.
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Returns the free-form event metadata.
    #[must_use]
    pub const fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }
}
