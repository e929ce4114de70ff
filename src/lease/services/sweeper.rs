//! Background sweep loop for lease expiry.
//!
//! The sweep is the engine's only background task. It runs on a fixed
//! interval independent of request traffic; store failures are logged and
//! retried on the next tick, never fatal to the process.

use crate::activity::ports::ActivityLog;
use crate::lease::ports::LeaseRepository;
use crate::lease::services::LeaseManager;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Spawns the periodic lease sweep loop.
///
/// The first tick fires immediately; subsequent ticks follow `interval`.
/// The returned handle can be aborted to stop the loop on shutdown.
pub fn spawn_sweep_loop<R, L, C>(
    manager: Arc<LeaseManager<R, L, C>>,
    interval: Duration,
) -> JoinHandle<()>
where
    R: LeaseRepository + 'static,
    L: ActivityLog + 'static,
    C: Clock + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            match manager.sweep_now().await {
                Ok(0) => {}
                Ok(flipped) => debug!(flipped, "lease sweep expired leases"),
                Err(err) => warn!(error = %err, "lease sweep failed; retrying next tick"),
            }
        }
    })
}
