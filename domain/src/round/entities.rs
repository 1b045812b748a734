//! Round and thread state entities

use super::config::{ConfigSnapshot, RoundConfig};
use super::participant::{ParticipantId, ParticipantOutcome};
use super::phase::RoundPhase;
use super::record::{SearchRecord, SummaryRecord};
use crate::core::error::DomainError;
use crate::gate::ConfigChangeGate;
use crate::resumption::ResumptionGuard;
use crate::sequencer;
use crate::tracking::TrackingRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One round's snapshot: which participants it expects to hear from and
/// what each of them did.
///
/// Round numbers are strictly increasing per thread and never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_number: u64,
    /// The user input that opened the round
    pub user_message: String,
    /// Participant IDs in trigger order, snapshotted at submission
    pub expected: Vec<ParticipantId>,
    pub outcomes: HashMap<ParticipantId, ParticipantOutcome>,
    /// UI-facing error indicators; non-blocking for gating
    pub search_failed: bool,
    pub summary_failed: bool,
}

impl RoundRecord {
    pub fn new(
        round_number: u64,
        user_message: impl Into<String>,
        expected: Vec<ParticipantId>,
    ) -> Self {
        let outcomes = expected
            .iter()
            .map(|id| (id.clone(), ParticipantOutcome::NotStarted))
            .collect();
        Self {
            round_number,
            user_message: user_message.into(),
            expected,
            outcomes,
            search_failed: false,
            summary_failed: false,
        }
    }

    pub fn outcome(&self, id: &ParticipantId) -> ParticipantOutcome {
        self.outcomes.get(id).copied().unwrap_or_default()
    }

    pub fn set_outcome(
        &mut self,
        id: &ParticipantId,
        outcome: ParticipantOutcome,
    ) -> Result<(), DomainError> {
        if !self.expected.contains(id) {
            return Err(DomainError::UnknownParticipant(id.to_string()));
        }
        self.outcomes.insert(id.clone(), outcome);
        Ok(())
    }

    /// Mark a previously-terminal participant as interrupted, re-opening
    /// the round for one more trigger (resume after a lost stream).
    pub fn mark_interrupted(&mut self, id: &ParticipantId) -> Result<(), DomainError> {
        self.set_outcome(id, ParticipantOutcome::Interrupted)
    }

    pub fn next_to_trigger(&self) -> Option<&ParticipantId> {
        sequencer::next_to_trigger(&self.outcomes, &self.expected)
    }

    pub fn all_accounted_for(&self) -> bool {
        sequencer::all_accounted_for(&self.outcomes, &self.expected)
    }

    /// Position of a participant in the round's trigger order
    pub fn participant_index(&self, id: &ParticipantId) -> Option<usize> {
        self.expected.iter().position(|p| p == id)
    }
}

/// All mutable coordination state for one conversation thread
///
/// Owned by exactly one orchestrator instance; collaborators never mutate
/// it directly. Every field cleared by a reset operation lives here (the
/// completion barrier's pending tokens are the application layer's share
/// of the same contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadState {
    pub thread_id: String,
    pub phase: RoundPhase,
    /// Highest round number with any message
    pub last_round: Option<u64>,
    /// Staged user input for a round that has not started streaming yet
    pub pending_message: Option<String>,
    /// Staged expected-participant set for the pending round
    pub pending_expected: Vec<ParticipantId>,
    /// Live configuration of the round being streamed
    pub current_config: Option<RoundConfig>,
    /// Configuration as of the previous completed round
    pub config_snapshot: Option<ConfigSnapshot>,
    pub rounds: HashMap<u64, RoundRecord>,
    pub search_records: HashMap<u64, SearchRecord>,
    pub summary_records: HashMap<u64, SummaryRecord>,
    pub is_streaming: bool,
    /// Last stream activity, for the defensive stale-streaming clear
    pub last_stream_activity_ms: Option<u64>,
    /// Round currently being regenerated, if any
    pub regenerating: Option<u64>,
    pub gate: ConfigChangeGate,
    pub tracking: TrackingRegistry,
    pub resumption: ResumptionGuard,
}

impl ThreadState {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            phase: RoundPhase::Idle,
            last_round: None,
            pending_message: None,
            pending_expected: Vec::new(),
            current_config: None,
            config_snapshot: None,
            rounds: HashMap::new(),
            search_records: HashMap::new(),
            summary_records: HashMap::new(),
            is_streaming: false,
            last_stream_activity_ms: None,
            regenerating: None,
            gate: ConfigChangeGate::new(),
            tracking: TrackingRegistry::new(),
            resumption: ResumptionGuard::new(),
        }
    }

    /// Next round number for a submission; strictly increasing, never reused
    pub fn next_round_number(&self) -> u64 {
        self.last_round.map_or(0, |r| r + 1)
    }

    pub fn round(&self, round: u64) -> Result<&RoundRecord, DomainError> {
        self.rounds.get(&round).ok_or(DomainError::RoundNotFound(round))
    }

    pub fn round_mut(&mut self, round: u64) -> Result<&mut RoundRecord, DomainError> {
        self.rounds
            .get_mut(&round)
            .ok_or(DomainError::RoundNotFound(round))
    }

    pub fn current_round(&self) -> Option<&RoundRecord> {
        self.last_round.and_then(|r| self.rounds.get(&r))
    }

    pub fn note_stream_activity(&mut self, now_ms: u64) {
        self.is_streaming = true;
        self.last_stream_activity_ms = Some(now_ms);
    }

    /// Whether search is enabled for the round currently in flight
    pub fn search_enabled(&self) -> bool {
        self.current_config
            .as_ref()
            .is_some_and(|c| c.search_enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::participant::CompletionReason;

    fn ids(names: &[&str]) -> Vec<ParticipantId> {
        names.iter().map(|n| ParticipantId::new(*n)).collect()
    }

    #[test]
    fn test_round_starts_with_not_started_outcomes() {
        let record = RoundRecord::new(0, "hello", ids(&["a", "b"]));
        assert_eq!(record.outcome(&"a".into()), ParticipantOutcome::NotStarted);
        assert_eq!(record.next_to_trigger(), Some(&"a".into()));
        assert!(!record.all_accounted_for());
    }

    #[test]
    fn test_unknown_participant_rejected() {
        let mut record = RoundRecord::new(0, "hi", ids(&["a"]));
        let err = record
            .set_outcome(&"ghost".into(), ParticipantOutcome::InProgress)
            .unwrap_err();
        assert!(matches!(err, DomainError::UnknownParticipant(_)));
    }

    #[test]
    fn test_mark_interrupted_reopens_round() {
        let mut record = RoundRecord::new(0, "hi", ids(&["a"]));
        record
            .set_outcome(&"a".into(), ParticipantOutcome::Completed(CompletionReason::Success))
            .unwrap();
        assert!(record.all_accounted_for());

        record.mark_interrupted(&"a".into()).unwrap();
        assert!(!record.all_accounted_for());
        assert_eq!(record.next_to_trigger(), Some(&"a".into()));
    }

    #[test]
    fn test_round_numbers_increase() {
        let mut state = ThreadState::new("t1");
        assert_eq!(state.next_round_number(), 0);
        state.last_round = Some(0);
        assert_eq!(state.next_round_number(), 1);
    }

    #[test]
    fn test_round_lookup() {
        let mut state = ThreadState::new("t1");
        assert!(state.round(0).is_err());
        state
            .rounds
            .insert(0, RoundRecord::new(0, "hi", ids(&["a"])));
        assert!(state.round(0).is_ok());
    }
}
