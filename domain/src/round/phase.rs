//! Round phase definitions

use serde::{Deserialize, Serialize};

/// Phase of a conversational round
///
/// A round moves `Idle → PreSearch → Participants → Summary → Idle`.
/// `PreSearch` is skipped entirely when search is disabled for the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No round is in flight
    #[default]
    Idle,
    /// Optional pre-processing search step
    PreSearch,
    /// Sequential participant streaming
    Participants,
    /// Post-round summarization
    Summary,
}

impl RoundPhase {
    pub fn as_str(&self) -> &str {
        match self {
            RoundPhase::Idle => "idle",
            RoundPhase::PreSearch => "pre_search",
            RoundPhase::Participants => "participants",
            RoundPhase::Summary => "summary",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            RoundPhase::Idle => "Idle",
            RoundPhase::PreSearch => "Pre-Search",
            RoundPhase::Participants => "Participants",
            RoundPhase::Summary => "Summary",
        }
    }

    /// Check if a round is actively in flight in this phase
    pub fn is_active(&self) -> bool {
        !matches!(self, RoundPhase::Idle)
    }
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(RoundPhase::PreSearch.to_string(), "Pre-Search");
        assert_eq!(RoundPhase::Participants.as_str(), "participants");
    }

    #[test]
    fn test_is_active() {
        assert!(!RoundPhase::Idle.is_active());
        assert!(RoundPhase::Summary.is_active());
    }
}
