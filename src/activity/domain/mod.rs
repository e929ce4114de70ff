//! Domain model for the activity log.
//!
//! Activity events are immutable tuples of timestamp, event kind, task
//! reference, actor reference, and free-form metadata.

mod error;
mod event;
mod ids;

pub use error::ParseEventKindError;
pub use event::{ActivityEvent, EventKind};
pub use ids::ActivityEventId;
