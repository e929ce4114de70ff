//! Repository port for lease persistence and exclusivity queries.

use crate::lease::domain::{Lease, LeaseId};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for lease repository operations.
pub type LeaseRepositoryResult<T> = Result<T, LeaseRepositoryError>;

/// Lease persistence contract.
///
/// Implementations must enforce the exclusivity invariant at the storage
/// boundary: `store` rejects a lease for a task that already has a lease
/// with a live status, so two concurrent grants cannot both succeed.
#[async_trait]
pub trait LeaseRepository: Send + Sync {
    /// Stores a new lease.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseRepositoryError::DuplicateLease`] when the lease ID
    /// already exists or [`LeaseRepositoryError::ActiveLeaseExists`] when
    /// the task already has a live lease.
    async fn store(&self, lease: &Lease) -> LeaseRepositoryResult<()>;

    /// Persists changes to an existing lease, conditional on the stored
    /// version matching the version the caller read.
    ///
    /// Returns the persisted record carrying the bumped version.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseRepositoryError::NotFound`] when the lease does not
    /// exist and [`LeaseRepositoryError::VersionConflict`] when another
    /// writer got there first.
    async fn update(&self, lease: &Lease) -> LeaseRepositoryResult<Lease>;

    /// Finds a lease by identifier.
    ///
    /// Returns `None` when the lease does not exist.
    async fn find_by_id(&self, id: LeaseId) -> LeaseRepositoryResult<Option<Lease>>;

    /// Returns the lease with a live status for the given task, if any.
    async fn find_live_for_task(&self, task_id: TaskId) -> LeaseRepositoryResult<Option<Lease>>;

    /// Returns the most recently granted non-released lease for the given
    /// task, if any. An expired-but-unreleased lease still blocks direct
    /// assignment until the task is reassigned.
    async fn find_unreleased_for_task(
        &self,
        task_id: TaskId,
    ) -> LeaseRepositoryResult<Option<Lease>>;

    /// Returns every lease with a live status whose expiry is at or before
    /// `now`. Used by the sweep.
    async fn find_expired(&self, now: DateTime<Utc>) -> LeaseRepositoryResult<Vec<Lease>>;
}

/// Errors returned by lease repository implementations.
#[derive(Debug, Clone, Error)]
pub enum LeaseRepositoryError {
    /// A lease with the same identifier already exists.
    #[error("duplicate lease identifier: {0}")]
    DuplicateLease(LeaseId),

    /// The task already has a lease with a live status.
    #[error("task {0} already has a live lease")]
    ActiveLeaseExists(TaskId),

    /// The lease was not found.
    #[error("lease not found: {0}")]
    NotFound(LeaseId),

    /// The stored version does not match the version the caller read.
    #[error("version conflict on lease {lease_id}: read {read}, stored {stored}")]
    VersionConflict {
        /// Lease the update targeted.
        lease_id: LeaseId,
        /// Version the caller based its edit on.
        read: u64,
        /// Version currently stored.
        stored: u64,
    },

    /// The store round-trip exceeded the configured deadline.
    #[error("lease store timed out")]
    Timeout,

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl LeaseRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
