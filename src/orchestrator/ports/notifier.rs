//! Notification sink port.
//!
//! Observers receive best-effort fan-out after every successful mutation.
//! Delivery is not ordered relative to the activity log append; the log,
//! not the notifications, is authoritative.

use crate::activity::domain::ActivityEvent;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notification delivery.
pub type NotifierResult = Result<(), NotifierError>;

/// Notification sink contract.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one event to the sink.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when delivery fails. The orchestrator
    /// logs the failure and carries on; it never rolls back the mutation.
    async fn notify(&self, event: &ActivityEvent) -> NotifierResult;
}

/// Errors returned by notification sink implementations.
#[derive(Debug, Clone, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifierError(pub Arc<dyn std::error::Error + Send + Sync>);

impl NotifierError {
    /// Wraps a delivery failure.
    #[must_use]
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
