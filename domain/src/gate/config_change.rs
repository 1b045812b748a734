//! Configuration-change gate
//!
//! Holds the two gating flags that cover a configuration-changed round
//! from submission until remote reconciliation has merged back into local
//! state. The flags are private and move only through the named
//! transitions below, so a partial clear is unrepresentable: the only
//! operations that unset `waiting_for_reconciliation` also unset
//! `config_change_round`, in the same call.

use serde::{Deserialize, Serialize};

/// Gating flags for the reconciliation window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChangeGate {
    /// Set the instant a changed-configuration round is submitted,
    /// before any network call, so nothing can race ahead of the gate
    config_change_round: Option<u64>,
    /// Set once the remote update underlying the submission has been
    /// acknowledged; covers the full submission-to-reconciliation window
    waiting_for_reconciliation: bool,
}

impl ConfigChangeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a new round may begin streaming
    pub fn is_blocking(&self) -> bool {
        self.config_change_round.is_some() || self.waiting_for_reconciliation
    }

    pub fn config_change_round(&self) -> Option<u64> {
        self.config_change_round
    }

    pub fn is_waiting_for_reconciliation(&self) -> bool {
        self.waiting_for_reconciliation
    }

    /// Record that a changed-configuration round was submitted. Must be
    /// called before the reconciliation request is issued.
    pub fn note_config_change(&mut self, round: u64) {
        self.config_change_round = Some(round);
    }

    /// Record that the remote update request completed. Set for every
    /// submission, changed or not, so "is a submission in flight" is a
    /// single flag.
    pub fn note_update_acknowledged(&mut self) {
        self.waiting_for_reconciliation = true;
    }

    /// Normal-path clear, invoked by the reconciliation-fetch completion
    /// handler once remote data has merged into local state. Clears both
    /// flags together. Returns whether anything changed.
    pub fn complete_reconciliation(&mut self) -> bool {
        let changed = self.config_change_round.is_some() || self.waiting_for_reconciliation;
        self.config_change_round = None;
        self.waiting_for_reconciliation = false;
        changed
    }

    /// Deliberate failure-path clear, after the prior configuration has
    /// been restored. A failed reconciliation must never clear the gate
    /// silently; leaving it blocking is the safe default until this is
    /// called.
    pub fn rollback(&mut self) -> bool {
        self.complete_reconciliation()
    }
}
