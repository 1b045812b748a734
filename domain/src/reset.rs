//! Reset coordinator
//!
//! The exact field sets cleared by each terminal action. Every operation
//! is idempotent (repeated calls produce the same state as one call) and
//! reports whether it changed anything, so change-detection layers are
//! not woken by no-ops. Collections are cleared in place, never replaced.
//!
//! The completion barrier's pending tokens are the application layer's
//! share of the same contract: callers of [`complete_round`] and friends
//! clear those alongside.

use crate::round::config::{ConfigSnapshot, RoundConfig};
use crate::round::entities::{RoundRecord, ThreadState};
use crate::round::phase::RoundPhase;

/// Shared transient clearing: streaming flags, staged message and
/// expected-participant state, regeneration marker. Leaves the tracking
/// registry and `waiting_for_reconciliation` alone — the registry is
/// round-scoped and round numbers never collide, and only the
/// reconciliation handler may clear the gate.
fn clear_transient(state: &mut ThreadState, regenerating: Option<u64>) -> bool {
    let mut changed = false;

    if state.phase != RoundPhase::Idle {
        state.phase = RoundPhase::Idle;
        changed = true;
    }
    if state.pending_message.take().is_some() {
        changed = true;
    }
    if !state.pending_expected.is_empty() {
        state.pending_expected.clear();
        changed = true;
    }
    if state.is_streaming {
        state.is_streaming = false;
        changed = true;
    }
    if state.last_stream_activity_ms.take().is_some() {
        changed = true;
    }
    if state.regenerating != regenerating {
        state.regenerating = regenerating;
        changed = true;
    }

    changed
}

/// Normal round completion.
///
/// Also snapshots the completed round's configuration as the baseline
/// for the next submission's change detection.
pub fn complete_round(state: &mut ThreadState) -> bool {
    let mut changed = clear_transient(state, None);

    if let Some(config) = state.current_config.take() {
        state.config_snapshot = Some(ConfigSnapshot::of(&config));
        changed = true;
    }

    changed
}

/// Begin regenerating one round: complete-round clearing, plus that
/// round's tracking markers, plus the regeneration marker.
pub fn start_regeneration(state: &mut ThreadState, round: u64) -> bool {
    let transient = clear_transient(state, Some(round));
    let tracking = state.tracking.clear_round(round);
    transient || tracking
}

/// Full thread reset: everything transient plus all thread-scoped data.
/// Used on navigation to a new or different thread.
pub fn full_reset(state: &mut ThreadState) -> bool {
    let mut changed = clear_transient(state, None);

    if !state.rounds.is_empty() {
        state.rounds.clear();
        changed = true;
    }
    if !state.search_records.is_empty() {
        state.search_records.clear();
        changed = true;
    }
    if !state.summary_records.is_empty() {
        state.summary_records.clear();
        changed = true;
    }
    if state.last_round.take().is_some() {
        changed = true;
    }
    if state.current_config.take().is_some() {
        changed = true;
    }
    if state.config_snapshot.take().is_some() {
        changed = true;
    }
    changed |= state.tracking.clear_all();
    changed |= state.resumption.clear();
    // Both gating flags drop together; the thread they guarded is gone
    changed |= state.gate.complete_reconciliation();

    changed
}

/// Stage a new round: complete-round clearing, then the pending message
/// and expected-participant set, with `waiting_for_reconciliation` raised
/// unconditionally so the flag covers the full submission window even
/// when the configuration did not change.
pub fn prepare_new_message(
    state: &mut ThreadState,
    round: u64,
    message: &str,
    config: RoundConfig,
) -> bool {
    clear_transient(state, None);

    let expected = config.ordered_participant_ids();
    state.pending_message = Some(message.to_string());
    state.pending_expected = expected.clone();
    state.current_config = Some(config);
    state.gate.note_update_acknowledged();
    state
        .rounds
        .entry(round)
        .or_insert_with(|| RoundRecord::new(round, message, expected));
    state.last_round = Some(state.last_round.map_or(round, |r| r.max(round)));

    true
}
