//! Task aggregate root and the lifecycle state machine.

use super::{Complexity, ParseTaskStateError, Priority, TaskDomainError, TaskId, TaskTitle, WorkTarget};
use crate::actor::WorkerId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task has been created but has no assignee yet.
    Draft,
    /// Task has an assignee but work has not started.
    Assigned,
    /// Task is being implemented under an active lease.
    InProgress,
    /// Work artifacts have been submitted.
    Submitted,
    /// A submission is awaiting checks and approval.
    InReview,
    /// Task has been completed.
    Done,
}

impl TaskState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::InReview => "in_review",
            Self::Done => "done",
        }
    }

    /// Returns whether the state permits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns whether the lifecycle permits moving from `self` to `to`.
    ///
    /// The table encodes the forward flow plus the two review outcomes:
    /// rejection reopens work, and a lease lost during review drops the
    /// task back to assigned. Reassignment is a dedicated operation on the
    /// aggregate, not a table edge.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::Assigned)
                | (Self::Assigned, Self::InProgress)
                | (Self::InProgress, Self::Submitted)
                | (Self::Submitted, Self::InReview)
                | (Self::InReview, Self::Done)
                | (Self::InReview, Self::InProgress)
                | (Self::InReview, Self::Assigned)
        )
    }
}

impl TryFrom<&str> for TaskState {
    type Error = ParseTaskStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "draft" => Ok(Self::Draft),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            "in_review" => Ok(Self::InReview),
            "done" => Ok(Self::Done),
            _ => Err(ParseTaskStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter object for creating a new task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Validated task title.
    pub title: TaskTitle,
    /// Free-form description of the work.
    pub description: String,
    /// Initial assignee, if known. Present means the task starts in
    /// [`TaskState::Assigned`]; absent means [`TaskState::Draft`].
    pub assignee: Option<WorkerId>,
    /// Scheduling priority.
    pub priority: Priority,
    /// Estimated size class.
    pub complexity: Complexity,
    /// Optional due timestamp.
    pub due_at: Option<DateTime<Utc>>,
    /// Optional target repository and branch.
    pub target: Option<WorkTarget>,
    /// Ordered acceptance criteria.
    pub acceptance_criteria: Vec<String>,
}

impl NewTask {
    /// Creates a minimal new-task payload with defaults for the optional
    /// fields.
    #[must_use]
    pub fn new(title: TaskTitle, description: impl Into<String>) -> Self {
        Self {
            title,
            description: description.into(),
            assignee: None,
            priority: Priority::default(),
            complexity: Complexity::default(),
            due_at: None,
            target: None,
            acceptance_criteria: Vec::new(),
        }
    }

    /// Sets the initial assignee.
    #[must_use]
    pub fn with_assignee(mut self, assignee: WorkerId) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Sets the scheduling priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the size estimate.
    #[must_use]
    pub const fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    /// Sets the due timestamp.
    #[must_use]
    pub const fn with_due_at(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    /// Sets the target repository and branch.
    #[must_use]
    pub fn with_target(mut self, target: WorkTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the ordered acceptance criteria.
    #[must_use]
    pub fn with_acceptance_criteria(
        mut self,
        criteria: impl IntoIterator<Item = String>,
    ) -> Self {
        self.acceptance_criteria = criteria.into_iter().collect();
        self
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    description: String,
    assignee: Option<WorkerId>,
    state: TaskState,
    priority: Priority,
    complexity: Complexity,
    due_at: Option<DateTime<Utc>>,
    target: Option<WorkTarget>,
    acceptance_criteria: Vec<String>,
    lease_held: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task record.
    ///
    /// Starts in [`TaskState::Assigned`] when an assignee is given and
    /// [`TaskState::Draft`] otherwise.
    #[must_use]
    pub fn new(spec: NewTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        let state = if spec.assignee.is_some() {
            TaskState::Assigned
        } else {
            TaskState::Draft
        };
        Self {
            id: TaskId::new(),
            title: spec.title,
            description: spec.description,
            assignee: spec.assignee,
            state,
            priority: spec.priority,
            complexity: spec.complexity,
            due_at: spec.due_at,
            target: spec.target,
            acceptance_criteria: spec.acceptance_criteria,
            lease_held: false,
            version: 1,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the task description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the current assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<&WorkerId> {
        self.assignee.as_ref()
    }

    /// Returns the task lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// Returns the scheduling priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the size estimate.
    #[must_use]
    pub const fn complexity(&self) -> Complexity {
        self.complexity
    }

    /// Returns the due timestamp, if any.
    #[must_use]
    pub const fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_at
    }

    /// Returns the target repository and branch, if any.
    #[must_use]
    pub const fn target(&self) -> Option<&WorkTarget> {
        self.target.as_ref()
    }

    /// Returns the ordered acceptance criteria.
    #[must_use]
    pub fn acceptance_criteria(&self) -> &[String] {
        &self.acceptance_criteria
    }

    /// Returns whether a lease has ever been granted for this task.
    #[must_use]
    pub const fn lease_held(&self) -> bool {
        self.lease_held
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

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Assigns the task to a worker.
    ///
    /// Permitted in [`TaskState::Draft`] (moving to assigned) and in
    /// [`TaskState::Assigned`] (replacing the assignee before work starts).
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] in any other
    /// state. Lease checks belong to the caller; the domain only validates
    /// the lifecycle edge.
    pub fn assign(&mut self, worker: WorkerId, clock: &impl Clock) -> Result<(), TaskDomainError> {
        match self.state {
            TaskState::Draft | TaskState::Assigned => {
                self.assignee = Some(worker);
                self.state = TaskState::Assigned;
                self.touch(clock);
                Ok(())
            }
            _ => Err(self.transition_error(TaskState::Assigned)),
        }
    }

    /// Marks the task as started under a freshly granted lease.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task
    /// is currently assigned.
    pub fn start(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskState::InProgress, clock)?;
        self.lease_held = true;
        Ok(())
    }

    /// Records that work artifacts were submitted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task
    /// is in progress.
    pub fn submit(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskState::Submitted, clock)
    }

    /// Moves a submitted task into review.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task
    /// has been submitted.
    pub fn enter_review(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskState::InReview, clock)
    }

    /// Completes the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task
    /// is in review.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskState::Done, clock)
    }

    /// Reopens a task in review after changes were requested.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task
    /// is in review.
    pub fn reopen(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskState::InProgress, clock)
    }

    /// Drops a task in review back to assigned after its lease was lost.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task
    /// is in review.
    pub fn fall_back_to_assigned(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskState::Assigned, clock)
    }

    /// Reassigns the task to a new worker.
    ///
    /// Permitted in any non-terminal state; moves the task back to
    /// [`TaskState::Assigned`]. The caller is responsible for releasing the
    /// current lease and clearing submission state.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// terminal.
    pub fn reassign(
        &mut self,
        worker: WorkerId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.state.is_terminal() {
            return Err(self.transition_error(TaskState::Assigned));
        }
        self.assignee = Some(worker);
        self.state = TaskState::Assigned;
        self.touch(clock);
        Ok(())
    }

    /// Validates that the record may be deleted.
    ///
    /// Deletion is permitted only before work has ever begun: the task must
    /// be in draft or assigned and must never have held a lease.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotDeletable`] otherwise.
    pub fn ensure_deletable(&self) -> Result<(), TaskDomainError> {
        let deletable = matches!(self.state, TaskState::Draft | TaskState::Assigned)
            && !self.lease_held;
        if deletable {
            Ok(())
        } else {
            Err(TaskDomainError::NotDeletable {
                task_id: self.id,
                state: self.state,
                lease_held: self.lease_held,
            })
        }
    }

    /// Applies a lifecycle transition validated against the state table.
    fn transition_to(&mut self, to: TaskState, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if !self.state.can_transition_to(to) {
            return Err(self.transition_error(to));
        }
        self.state = to;
        self.touch(clock);
        Ok(())
    }

    /// Builds the invalid-transition error for the current state.
    const fn transition_error(&self, to: TaskState) -> TaskDomainError {
        TaskDomainError::InvalidStateTransition {
            task_id: self.id,
            from: self.state,
            to,
        }
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
