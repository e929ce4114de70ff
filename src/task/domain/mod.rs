//! Domain model for task lifecycle management.
//!
//! The task domain models the lifecycle state machine, assignment, and
//! the descriptive fields carried by each task record, while keeping all
//! infrastructure concerns outside of the domain boundary.

mod classification;
mod descriptor;
mod error;
mod ids;
mod task;

pub use classification::{Complexity, Priority};
pub use descriptor::{TaskTitle, WorkTarget};
pub use error::{ParseTaskStateError, TaskDomainError};
pub use ids::TaskId;
pub use task::{NewTask, Task, TaskState};
