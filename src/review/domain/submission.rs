//! Submission aggregate root and the completion gate.

use super::{ParseSubmissionStatusError, ReviewDomainError, SubmissionId};
use crate::actor::WorkerId;
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Submission review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Awaiting review.
    Open,
    /// Explicitly approved by a coordinator.
    Approved,
    /// A coordinator requested changes.
    ChangesRequested,
    /// Merged after satisfying the completion gate.
    Merged,
    /// Closed without merging.
    Closed,
}

impl SubmissionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Approved => "approved",
            Self::ChangesRequested => "changes_requested",
            Self::Merged => "merged",
            Self::Closed => "closed",
        }
    }

    /// Returns whether the status permits no further review actions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Merged | Self::Closed)
    }
}

impl TryFrom<&str> for SubmissionStatus {
    type Error = ParseSubmissionStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "approved" => Ok(Self::Approved),
            "changes_requested" => Ok(Self::ChangesRequested),
            "merged" => Ok(Self::Merged),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseSubmissionStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission aggregate root: a worker's proposed completed artifact for a
/// task, subject to checks and approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    id: SubmissionId,
    task_id: TaskId,
    author: WorkerId,
    changed_files: Vec<String>,
    checks: BTreeMap<String, bool>,
    status: SubmissionStatus,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Submission {
    /// Creates a new open submission.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::EmptyChangedFiles`] when the file list
    /// is empty.
    pub fn new(
        task_id: TaskId,
        author: WorkerId,
        changed_files: Vec<String>,
        clock: &impl Clock,
    ) -> Result<Self, ReviewDomainError> {
        if changed_files.is_empty() {
            return Err(ReviewDomainError::EmptyChangedFiles);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: SubmissionId::new(),
            task_id,
            author,
            changed_files,
            checks: BTreeMap::new(),
            status: SubmissionStatus::Open,
            version: 1,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the submission identifier.
    #[must_use]
    pub const fn id(&self) -> SubmissionId {
        self.id
    }

    /// Returns the task this submission targets.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the submitting worker.
    #[must_use]
    pub const fn author(&self) -> &WorkerId {
        &self.author
    }

    /// Returns the changed-file identifiers.
    #[must_use]
    pub fn changed_files(&self) -> &[String] {
        &self.changed_files
    }

    /// Returns the named check results reported so far.
    #[must_use]
    pub const fn checks(&self) -> &BTreeMap<String, bool> {
        &self.checks
    }

    /// Returns the review status.
    #[must_use]
    pub const fn status(&self) -> SubmissionStatus {
        self.status
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

    /// Returns whether every named check is currently true.
    #[must_use]
    pub fn all_checks_passing(&self) -> bool {
        self.checks.values().all(|passed| *passed)
    }

    /// Returns whether the submission satisfies the completion gate:
    /// approved AND every named check true. Approval and passing checks
    /// are independent; both are required, in either arrival order.
    #[must_use]
    pub fn can_complete(&self) -> bool {
        self.status == SubmissionStatus::Approved && self.all_checks_passing()
    }

    /// Records a named check result. Idempotent per name: the last report
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::EmptyCheckName`] for a blank name and
    /// [`ReviewDomainError::NotReviewable`] when the submission is already
    /// terminal.
    pub fn record_check(
        &mut self,
        name: impl Into<String>,
        passed: bool,
        clock: &impl Clock,
    ) -> Result<(), ReviewDomainError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReviewDomainError::EmptyCheckName);
        }
        self.ensure_not_terminal()?;
        self.checks.insert(trimmed.to_owned(), passed);
        self.touch(clock);
        Ok(())
    }

    /// Approves the submission.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::NotReviewable`] unless the submission
    /// is open or has changes requested.
    pub fn approve(&mut self, clock: &impl Clock) -> Result<(), ReviewDomainError> {
        match self.status {
            SubmissionStatus::Open | SubmissionStatus::ChangesRequested => {
                self.status = SubmissionStatus::Approved;
                self.touch(clock);
                Ok(())
            }
            _ => Err(self.not_reviewable()),
        }
    }

    /// Marks the submission as needing changes.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::NotReviewable`] unless the submission
    /// is open or approved.
    pub fn request_changes(&mut self, clock: &impl Clock) -> Result<(), ReviewDomainError> {
        match self.status {
            SubmissionStatus::Open | SubmissionStatus::Approved => {
                self.status = SubmissionStatus::ChangesRequested;
                self.touch(clock);
                Ok(())
            }
            _ => Err(self.not_reviewable()),
        }
    }

    /// Merges the submission.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::GateNotSatisfied`] unless
    /// [`Submission::can_complete`] holds.
    pub fn merge(&mut self, clock: &impl Clock) -> Result<(), ReviewDomainError> {
        if !self.can_complete() {
            return Err(ReviewDomainError::GateNotSatisfied {
                submission_id: self.id,
                status: self.status,
                checks_passing: self.all_checks_passing(),
            });
        }
        self.status = SubmissionStatus::Merged;
        self.touch(clock);
        Ok(())
    }

    /// Closes the submission without merging.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::NotReviewable`] when the submission is
    /// already terminal.
    pub fn close(&mut self, clock: &impl Clock) -> Result<(), ReviewDomainError> {
        self.ensure_not_terminal()?;
        self.status = SubmissionStatus::Closed;
        self.touch(clock);
        Ok(())
    }

    fn ensure_not_terminal(&self) -> Result<(), ReviewDomainError> {
        if self.status.is_terminal() {
            return Err(self.not_reviewable());
        }
        Ok(())
    }

    const fn not_reviewable(&self) -> ReviewDomainError {
        ReviewDomainError::NotReviewable {
            submission_id: self.id,
            status: self.status,
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
