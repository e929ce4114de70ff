//! Port contracts for the intake bounded context.

mod repository;

pub use repository::{TaskRequestRepository, TaskRequestRepositoryError, TaskRequestRepositoryResult};
