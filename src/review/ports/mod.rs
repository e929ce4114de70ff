//! Port contracts for submission persistence.

mod repository;

pub use repository::{SubmissionRepository, SubmissionRepositoryError, SubmissionRepositoryResult};
