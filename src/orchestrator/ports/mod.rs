//! Port contracts for the orchestrator's external collaborators.

mod notifier;
mod vcs;

pub use notifier::{Notifier, NotifierError, NotifierResult};
pub use vcs::{VcsHost, VcsHostError, VcsHostResult};

#[cfg(test)]
pub use vcs::MockVcsHost;
