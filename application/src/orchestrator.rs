//! Round phase machine
//!
//! [`RoundOrchestrator`] is the single transition authority for one
//! conversation thread. Collaborators (stream executor, reconciliation
//! layer, render layer) feed completion signals in through the `notify_*`
//! and `acknowledge` entry points; the orchestrator recomputes phase
//! transitions from current state on every signal. All transitions are
//! level-triggered: a signal that arrives out of order is simply folded
//! into state and re-evaluated, never lost.
//!
//! Every public entry point is safe to call more than once with the same
//! logical intent. Duplicate resumption attempts are serialized through
//! the domain resumption guard; the owning host is single-threaded with
//! respect to this state, so no locking is involved.

use crate::barrier::{AckToken, CompletionBarrier};
use crate::ports::observer::{ErrorSource, NoObserver, RoundObserver};
use roundtable_domain::gate::{is_stale_unblock, should_wait_for_search};
use roundtable_domain::round::record::current_timestamp_ms;
use roundtable_domain::{
    CompletionReason, DomainError, ParticipantId, ParticipantOutcome, ResumptionKey,
    RoundConfig, RoundPhase, SearchRecord, StepStatus, SummaryRecord, ThreadState, reset,
    sequencer,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// An `is_streaming` flag with no stream activity for this long is
/// presumed orphaned and force-cleared. Deliberately tighter than the
/// pre-search staleness window: this is a last-resort fallback behind
/// the primary completion signal, not a gate.
pub const STREAM_STALE_AFTER_MS: u64 = 2_000;

/// Errors from orchestrator entry points
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Invalid round configuration: {0}")]
    InvalidConfig(&'static str),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Phase coordination for one conversation thread
pub struct RoundOrchestrator {
    state: ThreadState,
    barrier: Arc<CompletionBarrier>,
    cancel: CancellationToken,
    observer: Box<dyn RoundObserver>,
}

impl RoundOrchestrator {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            state: ThreadState::new(thread_id),
            barrier: Arc::new(CompletionBarrier::new()),
            cancel: CancellationToken::new(),
            observer: Box::new(NoObserver),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn RoundObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Current coordination state, for hosts that poll instead of
    /// observing
    pub fn state(&self) -> &ThreadState {
        &self.state
    }

    /// Shared handle to the completion barrier, for consumers that
    /// `wait` on acknowledgment tokens without holding the orchestrator
    pub fn barrier(&self) -> Arc<CompletionBarrier> {
        Arc::clone(&self.barrier)
    }

    /// Token collaborators watch to abort in-flight streams on stop
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // ==================== Submission ====================

    /// Submit a new round. The single path through which the ordered
    /// configuration-change sequence runs: the change flag is raised
    /// before anything else can observe the new round, then the pending
    /// message, expected-participant set, and (if enabled) the pending
    /// search record are staged atomically with the submission.
    ///
    /// The host must follow every submission with its remote update and
    /// then [`complete_reconciliation`](Self::complete_reconciliation);
    /// until then the round does not stream.
    pub fn submit_round(
        &mut self,
        config: RoundConfig,
        user_input: &str,
        now_ms: u64,
    ) -> Result<u64, OrchestratorError> {
        config.validate().map_err(OrchestratorError::InvalidConfig)?;

        // A staged submission still awaiting reconciliation must resolve
        // (complete or roll back) before the next one; a round that is
        // already streaming does not block submission
        let staged_unreconciled = self.state.pending_message.is_some()
            && self.state.gate.is_waiting_for_reconciliation();
        if staged_unreconciled {
            return Err(DomainError::SubmissionInProgress.into());
        }

        let round = self.state.next_round_number();
        let has_config_changed = self
            .state
            .config_snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.differs_from(&config));

        // Raised before the reconciliation request is issued, so nothing
        // can race ahead of the gate
        if has_config_changed {
            self.state.gate.note_config_change(round);
            self.observer.on_reconciliation_required(round);
        }

        let search_enabled = config.search_enabled;
        reset::prepare_new_message(&mut self.state, round, user_input, config);

        // Search record creation is sequenced with submission: there is
        // never an observable search-enabled round without a record
        if search_enabled && self.state.tracking.mark_search_triggered(round) {
            self.state
                .search_records
                .insert(round, SearchRecord::pending(round, now_ms));
            self.observer.on_search_trigger(round);
        }

        // A fresh round gets a fresh cancellation scope and a fresh
        // acknowledgment slate: tokens resolved (or still pending) for a
        // superseded round must not satisfy or wedge this one
        self.cancel = CancellationToken::new();
        self.barrier.clear();

        info!(
            round,
            has_config_changed, search_enabled, "round submitted"
        );
        Ok(round)
    }

    // ==================== Reconciliation ====================

    /// The remote update request behind the submission completed. Keeps
    /// `waiting_for_reconciliation` raised; idempotent with the flag
    /// already set at submission.
    pub fn acknowledge_reconciliation_request(&mut self, round: u64) {
        debug!(round, "reconciliation request acknowledged");
        self.state.gate.note_update_acknowledged();
    }

    /// Reconciliation data finished merging into local state. The sole
    /// normal-path clear of the config-change gate; both gating flags
    /// drop together.
    pub fn complete_reconciliation(&mut self, round: u64, now_ms: u64) {
        if self.state.gate.complete_reconciliation() {
            info!(round, "reconciliation complete, gate open");
        }
        self.advance(now_ms);
    }

    /// Reconciliation failed. The gate stays blocking: a silent failure
    /// must not let a configuration-changed round stream against an
    /// unreconciled remote.
    pub fn fail_reconciliation(&mut self, round: u64) {
        warn!(round, "reconciliation failed; gate remains blocking");
    }

    /// Deliberate unblock after the prior configuration has been
    /// restored following a failed reconciliation.
    pub fn rollback_reconciliation(&mut self, round: u64, now_ms: u64) {
        if self.state.gate.rollback() {
            warn!(round, "configuration rolled back; gate cleared");
        }
        self.advance(now_ms);
    }

    // ==================== Completion signals ====================

    /// Search stream status changed. Upserts are monotonic: a late
    /// duplicate creation can never regress a streaming record.
    pub fn notify_search_status(
        &mut self,
        round: u64,
        status: StepStatus,
        payload: Option<serde_json::Value>,
        now_ms: u64,
    ) -> Result<(), OrchestratorError> {
        self.reject_if_cancelled()?;
        let record = self
            .state
            .search_records
            .entry(round)
            .or_insert_with(|| SearchRecord::pending(round, now_ms));
        let changed = record.upsert_status(status, payload);
        debug!(round, status = %status, changed, "search status");

        if status == StepStatus::Failed {
            self.state.round_mut(round)?.search_failed = true;
            self.observer.on_error_indicator(round, ErrorSource::Search);
        }
        if status.is_terminal() {
            // Registered here, synchronously with the completion signal,
            // so the render layer's acknowledgment is awaited even if it
            // subscribes late
            self.barrier.register(AckToken::PreSearch);
        }
        self.advance(now_ms);
        Ok(())
    }

    /// A participant's stream produced a lifecycle signal.
    ///
    /// Terminal outcomes register the participant's acknowledgment token
    /// before any transition logic runs — the register must be observable
    /// by every pending-token check in the same causal chain.
    pub fn notify_participant_outcome(
        &mut self,
        round: u64,
        participant: &ParticipantId,
        outcome: ParticipantOutcome,
        now_ms: u64,
    ) -> Result<(), OrchestratorError> {
        self.reject_if_cancelled()?;
        let index = {
            let record = self.state.round_mut(round)?;
            record.set_outcome(participant, outcome)?;
            record.participant_index(participant)
        };

        match outcome {
            ParticipantOutcome::InProgress => {
                self.state.note_stream_activity(now_ms);
            }
            ParticipantOutcome::Completed(reason) => {
                if let Some(index) = index {
                    self.barrier.register(AckToken::Participant(index));
                }
                self.state.is_streaming = false;
                if reason == CompletionReason::Error {
                    self.observer
                        .on_error_indicator(round, ErrorSource::Participant);
                }
            }
            ParticipantOutcome::Interrupted => {
                self.state.is_streaming = false;
            }
            ParticipantOutcome::NotStarted => {}
        }

        debug!(round, participant = %participant, outcome = %outcome, "participant outcome");
        self.advance(now_ms);
        Ok(())
    }

    /// Summary stream status changed
    pub fn notify_summary_status(
        &mut self,
        round: u64,
        status: StepStatus,
        now_ms: u64,
    ) -> Result<(), OrchestratorError> {
        self.reject_if_cancelled()?;
        let record = self
            .state
            .summary_records
            .entry(round)
            .or_insert_with(|| SummaryRecord::pending(round));
        record.upsert_status(status);

        if status == StepStatus::Failed {
            self.state.round_mut(round)?.summary_failed = true;
            self.observer
                .on_error_indicator(round, ErrorSource::Summary);
        }
        self.advance(now_ms);
        Ok(())
    }

    /// Completion signals for a stopped round are rejected rather than
    /// folded in: stop is fatal for the round, and the next submission
    /// opens a fresh cancellation scope.
    fn reject_if_cancelled(&self) -> Result<(), OrchestratorError> {
        if self.cancel.is_cancelled() {
            return Err(DomainError::Cancelled.into());
        }
        Ok(())
    }

    /// The render layer finished presenting a completed item. Resolves
    /// the token and re-evaluates transitions that were held on it.
    pub fn acknowledge(&mut self, token: AckToken, now_ms: u64) {
        self.barrier.resolve(token);
        self.advance(now_ms);
    }

    // ==================== Transition pump ====================

    /// Re-evaluate phase transitions from current state.
    ///
    /// Called after every inbound signal and safe to call at any time:
    /// each step recomputes its gate from state rather than relying on
    /// having observed a specific past event.
    pub fn advance(&mut self, now_ms: u64) {
        let Some(round) = self.state.last_round else {
            return;
        };

        loop {
            match self.state.phase {
                RoundPhase::Idle => {
                    if self.state.pending_message.is_none() {
                        break;
                    }
                    if self.state.gate.is_blocking() {
                        debug!(round, "config-change gate blocking");
                        break;
                    }
                    if self.state.search_enabled() {
                        self.state.phase = RoundPhase::PreSearch;
                        self.observer.on_phase_start(round, &RoundPhase::PreSearch);
                    } else {
                        self.begin_participants(round);
                    }
                }
                RoundPhase::PreSearch => {
                    let record = self.state.search_records.get(&round);
                    if should_wait_for_search(self.state.search_enabled(), record, now_ms) {
                        break;
                    }
                    if is_stale_unblock(record, now_ms) {
                        warn!(round, "search record stale; unblocking participants");
                    }
                    self.observer
                        .on_phase_complete(round, &RoundPhase::PreSearch);
                    self.begin_participants(round);
                }
                RoundPhase::Participants => {
                    if !self.step_participants(round, now_ms) {
                        break;
                    }
                }
                RoundPhase::Summary => {
                    let terminal = self
                        .state
                        .summary_records
                        .get(&round)
                        .is_some_and(|r| r.status.is_terminal());
                    if !terminal {
                        break;
                    }
                    self.finish_round(round);
                    break;
                }
            }
        }
    }

    fn begin_participants(&mut self, round: u64) {
        self.state.phase = RoundPhase::Participants;
        self.observer
            .on_phase_start(round, &RoundPhase::Participants);
    }

    /// One participant-phase step. Returns whether the phase moved on to
    /// Summary (so the pump should keep going).
    fn step_participants(&mut self, round: u64, now_ms: u64) -> bool {
        let Ok(record) = self.state.round(round) else {
            return false;
        };

        // Participants stream sequentially: while one is in flight,
        // nothing new is triggered and the phase holds for its signal
        if sequencer::any_in_progress(&record.outcomes, &record.expected) {
            return false;
        }

        if let Some(next) = record.next_to_trigger().cloned() {
            // Mark in-progress before emitting, so a re-entrant advance
            // cannot double-trigger the same stream
            if self
                .state
                .round_mut(round)
                .and_then(|r| r.set_outcome(&next, ParticipantOutcome::InProgress))
                .is_ok()
            {
                self.state.note_stream_activity(now_ms);
                debug!(round, participant = %next, "triggering participant");
                self.observer.on_participant_trigger(round, &next);
            }
            return false;
        }

        if !sequencer::all_terminal(&record.outcomes, &record.expected) {
            // Something still streaming; wait for its signal
            return false;
        }

        // Every completed item's presentation must have settled
        let unacknowledged = self.barrier.is_pending(AckToken::PreSearch)
            || (0..record.expected.len())
                .any(|index| self.barrier.is_pending(AckToken::Participant(index)));
        if unacknowledged {
            debug!(round, "holding for visual acknowledgments");
            return false;
        }

        self.observer
            .on_phase_complete(round, &RoundPhase::Participants);
        if self.state.tracking.mark_summary_created(round) {
            self.state
                .summary_records
                .insert(round, SummaryRecord::pending(round));
            self.observer.on_summary_trigger(round);
        }
        self.state.phase = RoundPhase::Summary;
        self.observer.on_phase_start(round, &RoundPhase::Summary);
        true
    }

    fn finish_round(&mut self, round: u64) {
        self.observer.on_phase_complete(round, &RoundPhase::Summary);
        reset::complete_round(&mut self.state);
        self.barrier.clear();
        info!(round, "round complete");
    }

    // ==================== Terminal operations ====================

    /// User-initiated stop: the one fatal path for a round. Outstanding
    /// acknowledgment waits resolve immediately; no further transitions
    /// occur for the round.
    pub fn stop(&mut self) {
        info!(round = ?self.state.last_round, "stop requested");
        self.cancel.cancel();
        self.barrier.resolve_all();
        reset::complete_round(&mut self.state);
        self.barrier.clear();
    }

    /// Begin regenerating one round: complete-round clearing plus that
    /// round's tracking markers, so its search/summary may trigger again.
    pub fn start_regeneration(&mut self, round: u64) {
        info!(round, "regeneration started");
        reset::start_regeneration(&mut self.state, round);
        self.barrier.clear();
        self.cancel = CancellationToken::new();
    }

    /// Full thread reset, as on navigation to a different thread
    pub fn reset_thread(&mut self) {
        info!(thread = %self.state.thread_id, "thread reset");
        reset::full_reset(&mut self.state);
        self.barrier.clear();
        self.cancel = CancellationToken::new();
    }

    // ==================== Resumption ====================

    /// Idempotent entry for page-reload / re-entrant resumption logic:
    /// `true` exactly once per (thread, round, phase) until the round's
    /// signature changes. The first caller proceeds with resumption;
    /// later duplicates do nothing.
    pub fn try_resume(&mut self, round: u64, phase: RoundPhase) -> bool {
        let key = ResumptionKey::new(self.state.thread_id.clone(), round, phase);
        let first = self.state.resumption.try_start(key);
        if !first {
            debug!(round, phase = %phase, "resumption already attempted");
        }
        first
    }

    /// A believed-finished participant stream was discovered interrupted.
    /// Reopens the round and re-arms its resumption key so one more
    /// attempt is allowed.
    ///
    /// When the interrupted stream belongs to the thread's current round,
    /// the phase machine returns to `Participants` so the pump can
    /// re-trigger it; typically the round had already run to `Idle` before
    /// the interruption was discovered.
    pub fn mark_participant_interrupted(
        &mut self,
        round: u64,
        participant: &ParticipantId,
        now_ms: u64,
    ) -> Result<(), OrchestratorError> {
        self.state.round_mut(round)?.mark_interrupted(participant)?;
        let key = ResumptionKey::new(
            self.state.thread_id.clone(),
            round,
            RoundPhase::Participants,
        );
        self.state.resumption.invalidate(&key);
        debug!(round, participant = %participant, "participant marked interrupted");

        if self.state.last_round == Some(round) && self.state.phase != RoundPhase::Participants {
            self.begin_participants(round);
        }
        self.advance(now_ms);
        Ok(())
    }

    /// Defensive fallback: force-clear an `is_streaming` flag with no
    /// corresponding activity. Returns whether the flag was cleared.
    pub fn clear_stale_streaming(&mut self, now_ms: u64) -> bool {
        if !self.state.is_streaming {
            return false;
        }
        let stale = self
            .state
            .last_stream_activity_ms
            .is_none_or(|at| now_ms.saturating_sub(at) >= STREAM_STALE_AFTER_MS);
        if stale {
            warn!("stale streaming flag force-cleared");
            self.state.is_streaming = false;
            self.state.last_stream_activity_ms = None;
        }
        stale
    }

    /// Convenience wrapper over [`advance`](Self::advance) using the
    /// wall clock
    pub fn poll(&mut self) {
        self.advance(current_timestamp_ms());
    }
}
