//! Typed error hierarchy for Sprint View.
//!
//! Three enums cover the three layers:
//! - `SprintError`: state-machine and board operation failures
//! - `RepoError`: loading and saving the project document
//! - `TrackerError`: issue tracker lookups

use thiserror::Error;

/// Errors from board operations on the in-memory project.
#[derive(Debug, Error)]
pub enum SprintError {
    /// The operation was attempted in the wrong state, e.g. closing an
    /// already closed sprint or updating with no active scrum.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Task details were requested for scrum 0, which only holds carried
    /// forward work.
    #[error("Scrum {0} cannot be a display target (scrum numbers start at 1)")]
    InvalidScrumNumber(u32),

    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl SprintError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Whether the process must stop rather than keep serving a view over
    /// a dataset that may have diverged from its persisted copy.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidState(_) | Self::InvalidScrumNumber(_) => false,
            Self::Repository(_) => true,
            Self::Tracker(e) => e.is_fatal(),
        }
    }
}

/// Errors from a `ProjectRepository`.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Project data unavailable from {origin}: {reason}")]
    DataUnavailable { origin: String, reason: String },

    #[error("Failed to persist project data to {origin}: {reason}")]
    PersistFailure { origin: String, reason: String },

    #[error("Invalid project document: {0}")]
    InvalidDocument(String),
}

impl RepoError {
    pub fn unavailable(origin: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    pub fn persist(origin: impl Into<String>, reason: impl ToString) -> Self {
        Self::PersistFailure {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors from an `IssueTracker`.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Issue {0} not found")]
    NotFound(u64),

    #[error("Issue {0} has neither an assignee nor an author")]
    NoAssignee(u64),

    #[error("Issue tracker unavailable: {0}")]
    Unavailable(String),
}

impl TrackerError {
    /// A missing issue only invalidates one task-add entry; losing the
    /// tracker itself is fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

pub type Result<T, E = SprintError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_is_not_fatal() {
        let err = SprintError::invalid_state("no active scrum");
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Invalid state: no active scrum");
    }

    #[test]
    fn test_repository_errors_are_fatal() {
        let err: SprintError = RepoError::persist("./project_data", "disk full").into();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_tracker_not_found_is_recoverable() {
        let err: SprintError = TrackerError::NotFound(42).into();
        assert!(!err.is_fatal());
        let err: SprintError = TrackerError::Unavailable("timeout".into()).into();
        assert!(err.is_fatal());
    }
}
