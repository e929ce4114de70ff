//! Domain model for work submissions and the completion gate.

mod error;
mod ids;
mod submission;

pub use error::{ParseSubmissionStatusError, ReviewDomainError};
pub use ids::SubmissionId;
pub use submission::{Submission, SubmissionStatus};
