//! Participant identity and per-round outcomes

use serde::{Deserialize, Serialize};

/// Stable identity of a response producer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered, named response producer within a round
///
/// `priority` defines the participant's position in the sequential
/// trigger order; lower values stream first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub priority: u32,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, priority: u32) -> Self {
        Self {
            id: id.into(),
            priority,
        }
    }
}

/// How a participant's streaming attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionReason {
    /// Stream finished normally with content
    Success,
    /// Model failure, rate limit, or similar hard error
    Error,
    /// Reached a terminal state without being a hard error
    /// (truncated or content-filtered)
    Filtered,
}

/// Outcome of one participant within one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParticipantOutcome {
    /// Never triggered
    #[default]
    NotStarted,
    /// Registered and streaming, no terminal signal yet
    InProgress,
    /// Terminal, with a reason; counts as accounted-for even on error
    Completed(CompletionReason),
    /// Terminal but content-less: cut off mid-stream with no partial
    /// output and no terminal reason. Retryable.
    Interrupted,
}

impl ParticipantOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            ParticipantOutcome::NotStarted => "not_started",
            ParticipantOutcome::InProgress => "in_progress",
            ParticipantOutcome::Completed(CompletionReason::Success) => "success",
            ParticipantOutcome::Completed(CompletionReason::Error) => "error",
            ParticipantOutcome::Completed(CompletionReason::Filtered) => "filtered",
            ParticipantOutcome::Interrupted => "interrupted",
        }
    }

    /// Terminal states, including the retryable interrupted one
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ParticipantOutcome::Completed(_) | ParticipantOutcome::Interrupted
        )
    }

    /// Whether this participant no longer needs triggering for the round
    /// to complete. In-progress participants count: they must not be
    /// re-triggered while an active stream may still be running.
    pub fn is_accounted_for(&self) -> bool {
        matches!(
            self,
            ParticipantOutcome::InProgress | ParticipantOutcome::Completed(_)
        )
    }

    /// Whether the sequencer may (re-)trigger this participant.
    ///
    /// `Interrupted` is treated as equivalent to `NotStarted`: the prior
    /// attempt was cut off before finishing, which is distinct from
    /// "legitimately finished with nothing to say".
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ParticipantOutcome::NotStarted | ParticipantOutcome::Interrupted
        )
    }
}

impl std::fmt::Display for ParticipantOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_outcome_is_accounted_for() {
        let outcome = ParticipantOutcome::Completed(CompletionReason::Error);
        assert!(outcome.is_terminal());
        assert!(outcome.is_accounted_for());
        assert!(!outcome.is_retryable());
    }

    #[test]
    fn test_in_progress_is_accounted_but_not_terminal() {
        let outcome = ParticipantOutcome::InProgress;
        assert!(!outcome.is_terminal());
        assert!(outcome.is_accounted_for());
        assert!(!outcome.is_retryable());
    }

    #[test]
    fn test_interrupted_is_retryable() {
        let outcome = ParticipantOutcome::Interrupted;
        assert!(outcome.is_terminal());
        assert!(!outcome.is_accounted_for());
        assert!(outcome.is_retryable());
    }

    #[test]
    fn test_participant_id_display() {
        let id = ParticipantId::new("claude-sonnet");
        assert_eq!(id.to_string(), "claude-sonnet");
    }
}
