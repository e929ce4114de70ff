//! Lease manager: grants, extends, releases, and sweeps leases.

use crate::activity::{
    domain::{ActivityEvent, EventKind},
    ports::{ActivityLog, ActivityLogError},
};
use crate::actor::WorkerId;
use crate::lease::{
    domain::{Lease, LeaseDomainError, LeaseId, LeasePolicy},
    ports::{LeaseRepository, LeaseRepositoryError},
};
use crate::task::domain::TaskId;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Actor recorded for sweep-originated events.
const SWEEP_ACTOR: &str = "lease-sweep";

/// Service-level errors for lease manager operations.
#[derive(Debug, Error)]
pub enum LeaseManagerError {
    /// A live lease already exists for the task.
    #[error("task {task_id} is already leased by {holder}")]
    Conflict {
        /// Task the grant targeted.
        task_id: TaskId,
        /// Worker holding the existing lease.
        holder: WorkerId,
    },

    /// The lease was not found.
    #[error("lease not found: {0}")]
    NotFound(LeaseId),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] LeaseDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] LeaseRepositoryError),

    /// Activity log append failed.
    #[error(transparent)]
    Log(#[from] ActivityLogError),
}

/// Result type for lease manager operations.
pub type LeaseManagerResult<T> = Result<T, LeaseManagerError>;

/// Lease orchestration service.
///
/// The manager is the single writer for lease state; no other component
/// mutates lease records directly. It does not append activity events for
/// grant, extend, or release (the orchestrator owns the one-event-per-
/// operation rule); only the sweep, which has no calling operation, logs
/// its own `lease_expired` events.
#[derive(Clone)]
pub struct LeaseManager<R, L, C>
where
    R: LeaseRepository,
    L: ActivityLog,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    log: Arc<L>,
    clock: Arc<C>,
    policy: LeasePolicy,
}

impl<R, L, C> LeaseManager<R, L, C>
where
    R: LeaseRepository,
    L: ActivityLog,
    C: Clock + Send + Sync,
{
    /// Creates a new lease manager.
    #[must_use]
    pub const fn new(repository: Arc<R>, log: Arc<L>, clock: Arc<C>, policy: LeasePolicy) -> Self {
        Self {
            repository,
            log,
            clock,
            policy,
        }
    }

    /// Returns the duration policy in force.
    #[must_use]
    pub const fn policy(&self) -> &LeasePolicy {
        &self.policy
    }

    /// Grants an exclusive lease on a task.
    ///
    /// Uses the policy's default time-to-live when `ttl` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseManagerError::Conflict`] when a live lease already
    /// exists for the task. The storage adapter re-checks exclusivity under
    /// its write lock, so concurrent grants cannot both succeed.
    pub async fn grant(
        &self,
        task_id: TaskId,
        holder: WorkerId,
        ttl: Option<Duration>,
    ) -> LeaseManagerResult<Lease> {
        if let Some(existing) = self.repository.find_live_for_task(task_id).await? {
            return Err(LeaseManagerError::Conflict {
                task_id,
                holder: existing.holder().clone(),
            });
        }

        let lease = Lease::grant(
            task_id,
            holder,
            ttl.unwrap_or(self.policy.default_ttl),
            &*self.clock,
        );
        match self.repository.store(&lease).await {
            Ok(()) => Ok(lease),
            Err(LeaseRepositoryError::ActiveLeaseExists(conflicting)) => {
                // Lost the race to a concurrent grant.
                let holder_of_winner = self
                    .repository
                    .find_live_for_task(conflicting)
                    .await?
                    .map_or_else(|| lease.holder().clone(), |winner| winner.holder().clone());
                Err(LeaseManagerError::Conflict {
                    task_id: conflicting,
                    holder: holder_of_winner,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Pushes a lease's expiry forward, capped at the policy maximum.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseManagerError::NotFound`] for an unknown lease,
    /// [`LeaseDomainError::NotActive`] when the lease's effective status is
    /// not live (wall-clock expiry counts even before the sweep flips the
    /// stored status), and [`LeaseDomainError::NonPositiveExtension`] when
    /// `additional` would not push the expiry forward.
    pub async fn extend(&self, lease_id: LeaseId, additional: Duration) -> LeaseManagerResult<Lease> {
        let mut lease = self
            .repository
            .find_by_id(lease_id)
            .await?
            .ok_or(LeaseManagerError::NotFound(lease_id))?;

        let now = self.clock.utc();
        if !lease.is_live(now) {
            return Err(LeaseDomainError::NotActive {
                lease_id,
                status: lease.status_at(now, &self.policy),
            }
            .into());
        }

        lease.extend(additional, &self.policy)?;
        Ok(self.repository.update(&lease).await?)
    }

    /// Releases a lease. Idempotent: releasing an already-released lease
    /// succeeds without touching the store.
    ///
    /// Returns the lease and whether this call changed its status.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseManagerError::NotFound`] for an unknown lease.
    pub async fn release(&self, lease_id: LeaseId) -> LeaseManagerResult<(Lease, bool)> {
        let mut lease = self
            .repository
            .find_by_id(lease_id)
            .await?
            .ok_or(LeaseManagerError::NotFound(lease_id))?;

        if !lease.release() {
            return Ok((lease, false));
        }
        let persisted = self.repository.update(&lease).await?;
        Ok((persisted, true))
    }

    /// Sweeps every live lease whose expiry is at or before `now`, flipping
    /// it to expired and appending one `lease_expired` event per flip.
    ///
    /// The sweep never changes task state: the next operation against an
    /// affected task observes the expired lease and fails, forcing the
    /// caller to reassign.
    ///
    /// # Errors
    ///
    /// Returns the first repository or log error encountered; the sweep
    /// loop logs the failure and retries on the next tick.
    pub async fn sweep(&self, now: DateTime<Utc>) -> LeaseManagerResult<usize> {
        let expired = self.repository.find_expired(now).await?;
        let mut flipped = 0_usize;
        for mut lease in expired {
            if !lease.mark_expired() {
                continue;
            }
            match self.repository.update(&lease).await {
                Ok(_) => {}
                // Another writer (release, concurrent sweep) got there
                // first; skip rather than fight over a dead lease.
                Err(LeaseRepositoryError::VersionConflict { .. }) => continue,
                Err(other) => return Err(other.into()),
            }
            let event = ActivityEvent::new(
                EventKind::LeaseExpired,
                Some(lease.task_id()),
                SWEEP_ACTOR,
                json!({
                    "lease_id": lease.id().to_string(),
                    "holder": lease.holder().as_str(),
                    "expired_at": lease.expires_at().to_rfc3339(),
                }),
                &*self.clock,
            );
            self.log.append(&event).await?;
            flipped += 1;
        }
        Ok(flipped)
    }

    /// Sweeps using the injected clock's current time.
    ///
    /// # Errors
    ///
    /// See [`LeaseManager::sweep`].
    pub async fn sweep_now(&self) -> LeaseManagerResult<usize> {
        self.sweep(self.clock.utc()).await
    }
}
