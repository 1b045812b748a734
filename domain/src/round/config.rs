//! Round configuration and the previous-round snapshot

use super::participant::{Participant, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Conversation mode axis for a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundMode {
    /// Single primary participant driven
    #[default]
    Solo,
    /// All participants stream every round
    Ensemble,
}

impl RoundMode {
    pub fn as_str(&self) -> &str {
        match self {
            RoundMode::Solo => "solo",
            RoundMode::Ensemble => "ensemble",
        }
    }
}

impl std::fmt::Display for RoundMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Live configuration a round is submitted with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Participants joining the round, in trigger-priority order
    pub participants: Vec<Participant>,
    pub mode: RoundMode,
    pub search_enabled: bool,
}

impl RoundConfig {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self {
            participants,
            mode: RoundMode::default(),
            search_enabled: false,
        }
    }

    pub fn with_mode(mut self, mode: RoundMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_search(mut self) -> Self {
        self.search_enabled = true;
        self
    }

    /// Participant IDs in trigger order (by priority, then declaration order)
    pub fn ordered_participant_ids(&self) -> Vec<ParticipantId> {
        let mut sorted: Vec<&Participant> = self.participants.iter().collect();
        sorted.sort_by_key(|p| p.priority);
        sorted.iter().map(|p| p.id.clone()).collect()
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.participants.is_empty() {
            return Err("At least one participant is required");
        }
        Ok(())
    }
}

/// Configuration as of the previous completed round
///
/// A new round's submission diffs the live [`RoundConfig`] against this
/// snapshot to decide whether remote reconciliation must gate streaming.
/// Only the participant-ID set, mode, and search toggle participate in the
/// diff; priority reordering alone does not count as a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    participant_ids: BTreeSet<ParticipantId>,
    mode: RoundMode,
    search_enabled: bool,
}

impl ConfigSnapshot {
    pub fn of(config: &RoundConfig) -> Self {
        Self {
            participant_ids: config.participants.iter().map(|p| p.id.clone()).collect(),
            mode: config.mode,
            search_enabled: config.search_enabled,
        }
    }

    /// Compute `hasConfigChanged` for a new submission
    pub fn differs_from(&self, config: &RoundConfig) -> bool {
        let live: BTreeSet<ParticipantId> =
            config.participants.iter().map(|p| p.id.clone()).collect();
        live != self.participant_ids
            || config.mode != self.mode
            || config.search_enabled != self.search_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ids: &[&str]) -> RoundConfig {
        RoundConfig::new(
            ids.iter()
                .enumerate()
                .map(|(i, id)| Participant::new(*id, i as u32))
                .collect(),
        )
    }

    #[test]
    fn test_snapshot_unchanged() {
        let cfg = config(&["a", "b"]);
        let snapshot = ConfigSnapshot::of(&cfg);
        assert!(!snapshot.differs_from(&cfg));
    }

    #[test]
    fn test_participant_set_change_detected() {
        let snapshot = ConfigSnapshot::of(&config(&["a", "b"]));
        assert!(snapshot.differs_from(&config(&["a", "b", "c"])));
        assert!(snapshot.differs_from(&config(&["a"])));
    }

    #[test]
    fn test_mode_and_search_change_detected() {
        let cfg = config(&["a", "b"]);
        let snapshot = ConfigSnapshot::of(&cfg);

        assert!(snapshot.differs_from(&cfg.clone().with_mode(RoundMode::Ensemble)));
        assert!(snapshot.differs_from(&cfg.clone().with_search()));
    }

    #[test]
    fn test_priority_reorder_is_not_a_change() {
        let snapshot = ConfigSnapshot::of(&config(&["a", "b"]));
        let reordered = RoundConfig::new(vec![
            Participant::new("b", 0),
            Participant::new("a", 1),
        ]);
        assert!(!snapshot.differs_from(&reordered));
    }

    #[test]
    fn test_ordered_ids_follow_priority() {
        let cfg = RoundConfig::new(vec![
            Participant::new("late", 5),
            Participant::new("first", 0),
            Participant::new("mid", 2),
        ]);
        let ids: Vec<String> = cfg
            .ordered_participant_ids()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, vec!["first", "mid", "late"]);
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(RoundConfig::new(vec![]).validate().is_err());
        assert!(config(&["a"]).validate().is_ok());
    }
}
