//! Domain model for task leases.

mod error;
mod ids;
mod lease;
mod policy;

pub use error::{LeaseDomainError, ParseLeaseStatusError};
pub use ids::LeaseId;
pub use lease::{Lease, LeaseStatus};
pub use policy::LeasePolicy;
