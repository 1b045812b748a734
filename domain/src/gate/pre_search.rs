//! Pre-search gate
//!
//! Decides whether participant streaming must wait for the round's
//! search step.

use crate::round::record::{SearchRecord, StepStatus};

/// A pending or streaming search record older than this is treated as
/// stale: its completion signal is presumed lost and participants are
/// unblocked. Search data is advisory context, so starting without it is
/// preferable to a permanent deadlock.
pub const SEARCH_STALE_AFTER_MS: u64 = 15_000;

/// Whether participant streaming must hold for the round's search step.
///
/// Returns `false` (do not block) when search is disabled, when no record
/// exists (record creation is sequenced atomically with submission, so an
/// absent record means search was not requested), or when the record is
/// terminal. Returns `true` only for a fresh pending/streaming record.
pub fn should_wait_for_search(
    search_enabled: bool,
    record: Option<&SearchRecord>,
    now_ms: u64,
) -> bool {
    if !search_enabled {
        return false;
    }
    let Some(record) = record else {
        return false;
    };
    match record.status {
        StepStatus::Complete | StepStatus::Failed => false,
        StepStatus::Pending | StepStatus::Streaming => {
            record.age_ms(now_ms) < SEARCH_STALE_AFTER_MS
        }
    }
}

/// Whether the gate opened only because the record went stale, rather
/// than through a terminal status. Callers log this condition.
pub fn is_stale_unblock(record: Option<&SearchRecord>, now_ms: u64) -> bool {
    match record {
        Some(record) if !record.status.is_terminal() => {
            record.age_ms(now_ms) >= SEARCH_STALE_AFTER_MS
        }
        _ => false,
    }
}
