//! Round observer port
//!
//! Outbound edge of the orchestrator: gating decisions and tracking
//! events collaborators act on. The stream executor triggers a
//! participant when told to; the reconciliation layer issues its fetch;
//! a UI surfaces non-blocking error indicators. Implementations live
//! outside this crate.

use roundtable_domain::{ParticipantId, RoundPhase};

/// Which step produced a non-blocking, UI-facing error indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    Search,
    Summary,
    Participant,
}

impl ErrorSource {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorSource::Search => "search",
            ErrorSource::Summary => "summary",
            ErrorSource::Participant => "participant",
        }
    }
}

/// Callbacks for round coordination events
pub trait RoundObserver: Send + Sync {
    /// Called when a phase begins for a round
    fn on_phase_start(&self, round: u64, phase: &RoundPhase);

    /// Called when a phase finishes for a round
    fn on_phase_complete(&self, round: u64, phase: &RoundPhase);

    /// Called when the sequencer decides a participant should stream.
    /// The stream executor starts exactly one stream per call.
    fn on_participant_trigger(&self, round: u64, participant: &ParticipantId);

    /// Called when the round's search step should start streaming
    fn on_search_trigger(&self, _round: u64) {}

    /// Called when the round's summary step should start streaming
    fn on_summary_trigger(&self, _round: u64) {}

    /// Called when a changed-configuration submission needs the remote
    /// reconciliation round-trip before the round may stream.
    fn on_reconciliation_required(&self, _round: u64) {}

    /// Called when a step failed without blocking the round
    fn on_error_indicator(&self, _round: u64, _source: ErrorSource) {}
}

/// No-op observer for hosts that poll state instead
pub struct NoObserver;

impl RoundObserver for NoObserver {
    fn on_phase_start(&self, _round: u64, _phase: &RoundPhase) {}
    fn on_phase_complete(&self, _round: u64, _phase: &RoundPhase) {}
    fn on_participant_trigger(&self, _round: u64, _participant: &ParticipantId) {}
}
