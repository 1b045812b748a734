//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Round {0} not found")]
    RoundNotFound(u64),

    #[error("Participant {0} is not expected in this round")]
    UnknownParticipant(String),

    #[error("A submission is already staged for this thread")]
    SubmissionInProgress,

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
