//! Participant sequencer
//!
//! Computes which participant (if any) should stream next, and whether the
//! round's participant phase is fully complete. Pure functions over the
//! current outcome map: callers re-evaluate on every state change rather
//! than relying on having observed a specific past event, so an
//! out-of-order completion is simply picked up on the next read.

use crate::round::participant::{ParticipantId, ParticipantOutcome};
use std::collections::HashMap;

/// First participant in priority order that may be triggered.
///
/// In-progress participants are skipped, never re-triggered: this is what
/// prevents duplicate invocation when a page reload races with an active
/// stream. Interrupted participants (terminal but content-less, no
/// terminal reason) are retryable and treated like not-started.
pub fn next_to_trigger<'a>(
    outcomes: &HashMap<ParticipantId, ParticipantOutcome>,
    order: &'a [ParticipantId],
) -> Option<&'a ParticipantId> {
    order.iter().find(|id| {
        outcomes
            .get(id)
            .copied()
            .unwrap_or_default()
            .is_retryable()
    })
}

/// Whether every expected participant is accounted for: in progress or
/// terminal with a reason. Errors and filtered outcomes count, so a round
/// can complete without every participant succeeding.
pub fn all_accounted_for(
    outcomes: &HashMap<ParticipantId, ParticipantOutcome>,
    order: &[ParticipantId],
) -> bool {
    order.iter().all(|id| {
        outcomes
            .get(id)
            .copied()
            .unwrap_or_default()
            .is_accounted_for()
    })
}

/// Whether any expected participant is currently streaming. The phase
/// machine triggers at most one stream at a time; a new trigger waits
/// for the in-flight one to reach a terminal outcome.
pub fn any_in_progress(
    outcomes: &HashMap<ParticipantId, ParticipantOutcome>,
    order: &[ParticipantId],
) -> bool {
    order.iter().any(|id| {
        matches!(
            outcomes.get(id).copied().unwrap_or_default(),
            ParticipantOutcome::InProgress
        )
    })
}

/// Whether every expected participant reached a terminal-with-reason
/// outcome (nothing still streaming).
pub fn all_terminal(
    outcomes: &HashMap<ParticipantId, ParticipantOutcome>,
    order: &[ParticipantId],
) -> bool {
    order.iter().all(|id| {
        matches!(
            outcomes.get(id).copied().unwrap_or_default(),
            ParticipantOutcome::Completed(_)
        )
    })
}
