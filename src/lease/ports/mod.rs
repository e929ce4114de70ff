//! Port contracts for lease persistence.

mod repository;

pub use repository::{LeaseRepository, LeaseRepositoryError, LeaseRepositoryResult};
