//! Resumption guard
//!
//! Idempotent "attempted already" markers that serialize duplicate entry
//! into resumption logic after page reloads or re-entrant effects. The
//! first caller for a given key proceeds; every later caller with the
//! same key is told "already attempted" and does nothing. The owning
//! process is single-threaded with respect to this state, so a plain set
//! suffices; no locking.

use crate::round::phase::RoundPhase;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Structured key identifying one resumption attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResumptionKey {
    pub thread: String,
    pub round: u64,
    pub phase: RoundPhase,
}

impl ResumptionKey {
    pub fn new(thread: impl Into<String>, round: u64, phase: RoundPhase) -> Self {
        Self {
            thread: thread.into(),
            round,
            phase,
        }
    }
}

/// Once-per-key attempt markers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumptionGuard {
    attempted: HashSet<ResumptionKey>,
}

impl ResumptionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` exactly once per distinct key until it is invalidated
    pub fn try_start(&mut self, key: ResumptionKey) -> bool {
        self.attempted.insert(key)
    }

    /// Re-arm one more attempt for a key whose underlying signature
    /// changed, e.g. a round discovered to be incomplete after having
    /// been believed finished. Returns whether the key was armed.
    pub fn invalidate(&mut self, key: &ResumptionKey) -> bool {
        self.attempted.remove(key)
    }

    /// Drop all markers. Clears in place; empty guard reports no change.
    pub fn clear(&mut self) -> bool {
        if self.attempted.is_empty() {
            return false;
        }
        self.attempted.clear();
        true
    }

    pub fn is_empty(&self) -> bool {
        self.attempted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(round: u64) -> ResumptionKey {
        ResumptionKey::new("thread-1", round, RoundPhase::Participants)
    }

    #[test]
    fn test_first_caller_wins() {
        let mut guard = ResumptionGuard::new();
        assert!(guard.try_start(key(0)));
        assert!(!guard.try_start(key(0)));
        assert!(!guard.try_start(key(0)));
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        let mut guard = ResumptionGuard::new();
        assert!(guard.try_start(key(0)));
        assert!(guard.try_start(key(1)));
        assert!(guard.try_start(ResumptionKey::new(
            "thread-1",
            0,
            RoundPhase::Summary
        )));
        assert!(guard.try_start(ResumptionKey::new(
            "thread-2",
            0,
            RoundPhase::Participants
        )));
    }

    #[test]
    fn test_invalidate_rearms_exactly_once() {
        let mut guard = ResumptionGuard::new();
        assert!(guard.try_start(key(0)));

        assert!(guard.invalidate(&key(0)));
        assert!(guard.try_start(key(0)));
        assert!(!guard.try_start(key(0)));

        // Invalidating an unknown key arms nothing extra
        assert!(!guard.invalidate(&key(9)));
    }

    #[test]
    fn test_clear_on_empty_reports_no_change() {
        let mut guard = ResumptionGuard::new();
        assert!(!guard.clear());
        guard.try_start(key(0));
        assert!(guard.clear());
        assert!(guard.is_empty());
    }
}
