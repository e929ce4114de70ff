//! Error types for activity log domain parsing.

use thiserror::Error;

/// Error returned while parsing event kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown event kind: {0}")]
pub struct ParseEventKindError(pub String);
