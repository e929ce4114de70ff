//! In-memory repository for lease persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::lease::{
    domain::{Lease, LeaseId, LeaseStatus},
    ports::{LeaseRepository, LeaseRepositoryError, LeaseRepositoryResult},
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory lease repository.
///
/// The exclusivity check in `store` runs under the same write lock as the
/// insert, so two concurrent grants for one task serialize here.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeaseRepository {
    leases: Arc<RwLock<HashMap<LeaseId, Lease>>>,
}

impl InMemoryLeaseRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> LeaseRepositoryError {
    LeaseRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl LeaseRepository for InMemoryLeaseRepository {
    async fn store(&self, lease: &Lease) -> LeaseRepositoryResult<()> {
        let mut leases = self.leases.write().map_err(lock_error)?;
        if leases.contains_key(&lease.id()) {
            return Err(LeaseRepositoryError::DuplicateLease(lease.id()));
        }
        let live_exists = leases
            .values()
            .any(|existing| existing.task_id() == lease.task_id() && existing.status().is_live());
        if live_exists {
            return Err(LeaseRepositoryError::ActiveLeaseExists(lease.task_id()));
        }
        leases.insert(lease.id(), lease.clone());
        Ok(())
    }

    async fn update(&self, lease: &Lease) -> LeaseRepositoryResult<Lease> {
        let mut leases = self.leases.write().map_err(lock_error)?;
        let stored = leases
            .get(&lease.id())
            .ok_or(LeaseRepositoryError::NotFound(lease.id()))?;
        if stored.version() != lease.version() {
            return Err(LeaseRepositoryError::VersionConflict {
                lease_id: lease.id(),
                read: lease.version(),
                stored: stored.version(),
            });
        }
        let mut next = lease.clone();
        next.bump_version();
        leases.insert(next.id(), next.clone());
        Ok(next)
    }

    async fn find_by_id(&self, id: LeaseId) -> LeaseRepositoryResult<Option<Lease>> {
        let leases = self.leases.read().map_err(lock_error)?;
        Ok(leases.get(&id).cloned())
    }

    async fn find_live_for_task(&self, task_id: TaskId) -> LeaseRepositoryResult<Option<Lease>> {
        let leases = self.leases.read().map_err(lock_error)?;
        Ok(leases
            .values()
            .find(|lease| lease.task_id() == task_id && lease.status().is_live())
            .cloned())
    }

    async fn find_unreleased_for_task(
        &self,
        task_id: TaskId,
    ) -> LeaseRepositoryResult<Option<Lease>> {
        let leases = self.leases.read().map_err(lock_error)?;
        Ok(leases
            .values()
            .filter(|lease| {
                lease.task_id() == task_id && lease.status() != LeaseStatus::Released
            })
            .max_by_key(|lease| lease.granted_at())
            .cloned())
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> LeaseRepositoryResult<Vec<Lease>> {
        let leases = self.leases.read().map_err(lock_error)?;
        Ok(leases
            .values()
            .filter(|lease| lease.status().is_live() && lease.expires_at() <= now)
            .cloned()
            .collect())
    }
}
