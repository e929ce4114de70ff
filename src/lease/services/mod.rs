//! Lease manager service and the periodic sweep loop.

mod manager;
mod sweeper;

pub use manager::{LeaseManager, LeaseManagerError, LeaseManagerResult};
pub use sweeper::spawn_sweep_loop;
