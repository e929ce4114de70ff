//! Port contracts for the activity log.

mod log;

pub use log::{ActivityLog, ActivityLogError, ActivityLogResult};
