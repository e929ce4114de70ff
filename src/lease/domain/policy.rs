//! Lease duration policy.

use chrono::Duration;

/// Configurable durations governing lease grants, extensions, and the
/// sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeasePolicy {
    /// Time-to-live applied when a grant does not name one.
    pub default_ttl: Duration,
    /// Cap on the total span from grant to expiry, including extensions.
    pub max_total: Duration,
    /// Window before expiry in which a lease reports as expiring soon.
    pub expiring_soon_window: Duration,
    /// Interval between sweep ticks.
    pub sweep_interval: std::time::Duration,
}

impl Default for LeasePolicy {
    fn default() -> Self {
        Self {
            default_ttl: Duration::minutes(30),
            max_total: Duration::hours(8),
            expiring_soon_window: Duration::minutes(5),
            sweep_interval: std::time::Duration::from_secs(60),
        }
    }
}
