//! Domain model for task request intake.

mod error;
mod ids;
mod request;

pub use error::{IntakeDomainError, ParseRequestStatusError};
pub use ids::TaskRequestId;
pub use request::{NewTaskRequest, RequestStatus, TaskRequest};
