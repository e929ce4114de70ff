//! In-memory repository for submission persistence.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::review::{
    domain::{Submission, SubmissionId},
    ports::{SubmissionRepository, SubmissionRepositoryError, SubmissionRepositoryResult},
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory submission repository.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubmissionRepository {
    submissions: Arc<RwLock<HashMap<SubmissionId, Submission>>>,
}

impl InMemorySubmissionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> SubmissionRepositoryError {
    SubmissionRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn store(&self, submission: &Submission) -> SubmissionRepositoryResult<()> {
        let mut submissions = self.submissions.write().map_err(lock_error)?;
        if submissions.contains_key(&submission.id()) {
            return Err(SubmissionRepositoryError::DuplicateSubmission(
                submission.id(),
            ));
        }
        submissions.insert(submission.id(), submission.clone());
        Ok(())
    }

    async fn update(&self, submission: &Submission) -> SubmissionRepositoryResult<Submission> {
        let mut submissions = self.submissions.write().map_err(lock_error)?;
        let stored = submissions
            .get(&submission.id())
            .ok_or(SubmissionRepositoryError::NotFound(submission.id()))?;
        if stored.version() != submission.version() {
            return Err(SubmissionRepositoryError::VersionConflict {
                submission_id: submission.id(),
                read: submission.version(),
                stored: stored.version(),
            });
        }
        let mut next = submission.clone();
        next.bump_version();
        submissions.insert(next.id(), next.clone());
        Ok(next)
    }

    async fn find_by_id(&self, id: SubmissionId) -> SubmissionRepositoryResult<Option<Submission>> {
        let submissions = self.submissions.read().map_err(lock_error)?;
        Ok(submissions.get(&id).cloned())
    }

    async fn find_open_for_task(
        &self,
        task_id: TaskId,
    ) -> SubmissionRepositoryResult<Option<Submission>> {
        let submissions = self.submissions.read().map_err(lock_error)?;
        Ok(submissions
            .values()
            .find(|submission| {
                submission.task_id() == task_id && !submission.status().is_terminal()
            })
            .cloned())
    }
}
