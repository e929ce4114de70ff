//! Recording collaborators: capture calls instead of reaching out.
//!
//! These stand in for the real version-control provider and notification
//! transport, both of which are outside the engine's scope. Tests assert
//! against the recorded calls.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::activity::domain::ActivityEvent;
use crate::orchestrator::ports::{
    Notifier, NotifierError, NotifierResult, VcsHost, VcsHostError, VcsHostResult,
};
use crate::review::domain::SubmissionId;
use crate::task::domain::{TaskId, WorkTarget};

/// One recorded version-control invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    /// A working branch was created for a task.
    CreateBranch {
        /// Repository and branch the work targets.
        target: WorkTarget,
        /// Task the branch belongs to.
        task_id: TaskId,
    },
    /// A submission was merged.
    Merge {
        /// The merged submission.
        submission_id: SubmissionId,
    },
}

/// Version-control provider that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingVcsHost {
    calls: Arc<RwLock<Vec<VcsCall>>>,
}

impl RecordingVcsHost {
    /// Creates a recording provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded calls in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`VcsHostError`] when the record lock is poisoned.
    pub fn calls(&self) -> VcsHostResult<Vec<VcsCall>> {
        Ok(self.calls.read().map_err(lock_error)?.clone())
    }
}

fn lock_error(err: impl std::fmt::Display) -> VcsHostError {
    VcsHostError::unavailable(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl VcsHost for RecordingVcsHost {
    async fn create_branch(&self, target: &WorkTarget, task_id: TaskId) -> VcsHostResult<()> {
        self.calls.write().map_err(lock_error)?.push(VcsCall::CreateBranch {
            target: target.clone(),
            task_id,
        });
        Ok(())
    }

    async fn merge(&self, submission_id: SubmissionId) -> VcsHostResult<()> {
        self.calls
            .write()
            .map_err(lock_error)?
            .push(VcsCall::Merge { submission_id });
        Ok(())
    }
}

/// Notification sink that records every delivered event.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    deliveries: Arc<RwLock<Vec<ActivityEvent>>>,
}

impl RecordingNotifier {
    /// Creates a recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the delivered events in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when the record lock is poisoned.
    pub fn deliveries(&self) -> Result<Vec<ActivityEvent>, NotifierError> {
        Ok(self.deliveries.read().map_err(delivery_error)?.clone())
    }
}

fn delivery_error(err: impl std::fmt::Display) -> NotifierError {
    NotifierError::delivery(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &ActivityEvent) -> NotifierResult {
        self.deliveries
            .write()
            .map_err(delivery_error)?
            .push(event.clone());
        Ok(())
    }
}
