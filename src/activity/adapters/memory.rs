//! In-memory append-only activity log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

use crate::activity::{
    domain::ActivityEvent,
    ports::{ActivityLog, ActivityLogError, ActivityLogResult},
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory activity log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryActivityLog {
    events: Arc<RwLock<Vec<ActivityEvent>>>,
}

impl InMemoryActivityLog {
    /// Creates an empty in-memory log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of appended events.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityLogError::Persistence`] when the backing lock is
    /// poisoned.
    pub fn len(&self) -> ActivityLogResult<usize> {
        let events = self.events.read().map_err(|err| {
            ActivityLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(events.len())
    }

    /// Returns whether the log holds no events.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityLogError::Persistence`] when the backing lock is
    /// poisoned.
    pub fn is_empty(&self) -> ActivityLogResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns a snapshot of every appended event, in append order.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityLogError::Persistence`] when the backing lock is
    /// poisoned.
    pub fn snapshot(&self) -> ActivityLogResult<Vec<ActivityEvent>> {
        let events = self.events.read().map_err(|err| {
            ActivityLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(events.clone())
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn append(&self, event: &ActivityEvent) -> ActivityLogResult<()> {
        let mut events = self.events.write().map_err(|err| {
            ActivityLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        events.push(event.clone());
        Ok(())
    }

    async fn for_task(&self, task_id: TaskId) -> ActivityLogResult<Vec<ActivityEvent>> {
        let events = self.events.read().map_err(|err| {
            ActivityLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(events
            .iter()
            .filter(|event| event.task_id() == Some(task_id))
            .cloned()
            .collect())
    }

    async fn in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ActivityLogResult<Vec<ActivityEvent>> {
        let events = self.events.read().map_err(|err| {
            ActivityLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(events
            .iter()
            .filter(|event| event.recorded_at() >= from && event.recorded_at() < to)
            .cloned()
            .collect())
    }
}
