//! Lease aggregate root and status lifecycle.

use super::{LeaseDomainError, LeaseId, LeasePolicy, ParseLeaseStatusError};
use crate::actor::WorkerId;
use crate::task::domain::TaskId;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lease lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    /// The lease is live and not close to expiry.
    Active,
    /// The lease is live but inside the expiring-soon window.
    ExpiringSoon,
    /// The lease passed its expiry without being released.
    Expired,
    /// The lease was explicitly released.
    Released,
}

impl LeaseStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::ExpiringSoon => "expiring_soon",
            Self::Expired => "expired",
            Self::Released => "released",
        }
    }

    /// Returns whether the status still confers exclusivity.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Active | Self::ExpiringSoon)
    }
}

impl TryFrom<&str> for LeaseStatus {
    type Error = ParseLeaseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "expiring_soon" => Ok(Self::ExpiringSoon),
            "expired" => Ok(Self::Expired),
            "released" => Ok(Self::Released),
            _ => Err(ParseLeaseStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for LeaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lease aggregate root: a time-boxed exclusive claim by one worker on one
/// task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    id: LeaseId,
    task_id: TaskId,
    holder: WorkerId,
    granted_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: LeaseStatus,
    version: u64,
}

impl Lease {
    /// Grants a new lease expiring `ttl` after the current clock time.
    #[must_use]
    pub fn grant(task_id: TaskId, holder: WorkerId, ttl: Duration, clock: &impl Clock) -> Self {
        let granted_at = clock.utc();
        Self {
            id: LeaseId::new(),
            task_id,
            holder,
            granted_at,
            expires_at: granted_at + ttl,
            status: LeaseStatus::Active,
            version: 1,
        }
    }

    /// Returns the lease identifier.
    #[must_use]
    pub const fn id(&self) -> LeaseId {
        self.id
    }

    /// Returns the leased task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the worker holding the lease.
    #[must_use]
    pub const fn holder(&self) -> &WorkerId {
        &self.holder
    }

    /// Returns the grant timestamp.
    #[must_use]
    pub const fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }

    /// Returns the expiry timestamp.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the stored lease status.
    ///
    /// The stored status lags wall-clock expiry until the sweep or a lazy
    /// check flips it; use [`Lease::status_at`] for the effective status.
    #[must_use]
    pub const fn status(&self) -> LeaseStatus {
        self.status
    }

    /// Returns the optimistic-lock version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the effective status at `now`, accounting for wall-clock
    /// expiry and the expiring-soon window without mutating the record.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>, policy: &LeasePolicy) -> LeaseStatus {
        if !self.status.is_live() {
            return self.status;
        }
        if self.expires_at <= now {
            return LeaseStatus::Expired;
        }
        if self.expires_at - now <= policy.expiring_soon_window {
            return LeaseStatus::ExpiringSoon;
        }
        LeaseStatus::Active
    }

    /// Returns whether the lease still confers exclusivity at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status.is_live() && self.expires_at > now
    }

    /// Pushes the expiry forward by `additional`, capped at the policy's
    /// maximum total duration from the grant timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseDomainError::NonPositiveExtension`] when `additional`
    /// is zero or negative, and [`LeaseDomainError::NotActive`] unless the
    /// stored status is live.
    pub fn extend(
        &mut self,
        additional: Duration,
        policy: &LeasePolicy,
    ) -> Result<(), LeaseDomainError> {
        if additional <= Duration::zero() {
            return Err(LeaseDomainError::NonPositiveExtension { lease_id: self.id });
        }
        if !self.status.is_live() {
            return Err(LeaseDomainError::NotActive {
                lease_id: self.id,
                status: self.status,
            });
        }
        let cap = self.granted_at + policy.max_total;
        self.expires_at = (self.expires_at + additional).min(cap);
        Ok(())
    }

    /// Releases the lease. Idempotent: releasing an already-released lease
    /// is a no-op. Returns whether the status changed.
    pub fn release(&mut self) -> bool {
        if self.status == LeaseStatus::Released {
            return false;
        }
        self.status = LeaseStatus::Released;
        true
    }

    /// Flips a live lease to expired. Returns whether the status changed.
    pub fn mark_expired(&mut self) -> bool {
        if !self.status.is_live() {
            return false;
        }
        self.status = LeaseStatus::Expired;
        true
    }

    /// Bumps the optimistic-lock version. Reserved for repository adapters.
    pub(crate) const fn bump_version(&mut self) {
        self.version += 1;
    }
}
