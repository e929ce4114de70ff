//! In-memory repository for task request persistence.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::intake::{
    domain::{RequestStatus, TaskRequest, TaskRequestId},
    ports::{TaskRequestRepository, TaskRequestRepositoryError, TaskRequestRepositoryResult},
};

/// Thread-safe in-memory task request repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRequestRepository {
    requests: Arc<RwLock<HashMap<TaskRequestId, TaskRequest>>>,
}

impl InMemoryTaskRequestRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> TaskRequestRepositoryError {
    TaskRequestRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskRequestRepository for InMemoryTaskRequestRepository {
    async fn store(&self, request: &TaskRequest) -> TaskRequestRepositoryResult<()> {
        let mut requests = self.requests.write().map_err(lock_error)?;
        if requests.contains_key(&request.id()) {
            return Err(TaskRequestRepositoryError::DuplicateRequest(request.id()));
        }
        requests.insert(request.id(), request.clone());
        Ok(())
    }

    async fn update(&self, request: &TaskRequest) -> TaskRequestRepositoryResult<TaskRequest> {
        let mut requests = self.requests.write().map_err(lock_error)?;
        let stored = requests
            .get(&request.id())
            .ok_or(TaskRequestRepositoryError::NotFound(request.id()))?;
        if stored.version() != request.version() {
            return Err(TaskRequestRepositoryError::VersionConflict {
                request_id: request.id(),
                read: request.version(),
                stored: stored.version(),
            });
        }
        let mut next = request.clone();
        next.bump_version();
        requests.insert(next.id(), next.clone());
        Ok(next)
    }

    async fn find_by_id(
        &self,
        id: TaskRequestId,
    ) -> TaskRequestRepositoryResult<Option<TaskRequest>> {
        let requests = self.requests.read().map_err(lock_error)?;
        Ok(requests.get(&id).cloned())
    }

    async fn list_pending(&self) -> TaskRequestRepositoryResult<Vec<TaskRequest>> {
        let requests = self.requests.read().map_err(lock_error)?;
        let mut pending: Vec<TaskRequest> = requests
            .values()
            .filter(|request| request.status() == RequestStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(TaskRequest::created_at);
        Ok(pending)
    }
}
