//! Validated descriptive value objects for task records.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a task title.
const MAX_TITLE_LENGTH: usize = 255;

/// Validated task title.
///
/// Titles must be non-empty after trimming and must not exceed
/// `MAX_TITLE_LENGTH` characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated task title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the value is empty after
    /// trimming, or [`TaskDomainError::TitleTooLong`] when it exceeds the
    /// length limit.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        if trimmed.chars().count() > MAX_TITLE_LENGTH {
            return Err(TaskDomainError::TitleTooLong(MAX_TITLE_LENGTH));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskTitle {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque target repository and branch references for a task.
///
/// Both components are validated only for non-emptiness; their internal
/// structure belongs to the external version-control provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkTarget {
    repository: String,
    branch: String,
}

impl WorkTarget {
    /// Creates a validated work target.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTargetRepository`] or
    /// [`TaskDomainError::EmptyTargetBranch`] when either component is empty
    /// after trimming.
    pub fn new(
        repository: impl Into<String>,
        branch: impl Into<String>,
    ) -> Result<Self, TaskDomainError> {
        let repository_raw = repository.into();
        let repository_trimmed = repository_raw.trim();
        if repository_trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTargetRepository);
        }
        let branch_raw = branch.into();
        let branch_trimmed = branch_raw.trim();
        if branch_trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTargetBranch);
        }
        Ok(Self {
            repository: repository_trimmed.to_owned(),
            branch: branch_trimmed.to_owned(),
        })
    }

    /// Returns the target repository reference.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the target branch reference.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl fmt::Display for WorkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.branch)
    }
}
