//! Per-round idempotency bookkeeping
//!
//! Pure registry of "has this round's X already been triggered" markers.
//! No business rules live here; gates and the orchestrator decide what the
//! markers mean. Append-only except through the reset operations.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Round-scoped trigger markers
///
/// Round numbers are never reused within a thread, so a completed round's
/// markers can persist harmlessly until regeneration or a full reset.
/// Every mutation reports whether it changed anything, so callers watching
/// for changes are not woken by no-ops.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingRegistry {
    search_triggered: HashSet<u64>,
    summary_created: HashSet<u64>,
}

impl TrackingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the round's search as triggered. Returns `false` if it
    /// already was, letting the caller skip a duplicate trigger.
    pub fn mark_search_triggered(&mut self, round: u64) -> bool {
        self.search_triggered.insert(round)
    }

    pub fn is_search_triggered(&self, round: u64) -> bool {
        self.search_triggered.contains(&round)
    }

    /// Mark the round's summary as created. Returns `false` if it
    /// already was.
    pub fn mark_summary_created(&mut self, round: u64) -> bool {
        self.summary_created.insert(round)
    }

    pub fn is_summary_created(&self, round: u64) -> bool {
        self.summary_created.contains(&round)
    }

    /// Drop markers for one round only (regeneration). Returns whether
    /// anything was removed.
    pub fn clear_round(&mut self, round: u64) -> bool {
        let removed_search = self.search_triggered.remove(&round);
        let removed_summary = self.summary_created.remove(&round);
        removed_search || removed_summary
    }

    /// Drop every marker (full reset). Clears in place; an already-empty
    /// registry reports no change.
    pub fn clear_all(&mut self) -> bool {
        if self.search_triggered.is_empty() && self.summary_created.is_empty() {
            return false;
        }
        self.search_triggered.clear();
        self.summary_created.clear();
        true
    }

    pub fn is_empty(&self) -> bool {
        self.search_triggered.is_empty() && self.summary_created.is_empty()
    }
}
