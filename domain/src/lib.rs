//! Domain layer for roundtable
//!
//! This crate contains the round coordination logic: entities, gates,
//! the participant sequencer, and the reset transforms. It is pure and
//! synchronous — no async runtime, no I/O. The application layer owns
//! the async surface (completion barrier, orchestrator).
//!
//! # Core Concepts
//!
//! ## Round
//!
//! One full cycle of user input → (optional search) → sequential
//! participant responses → (optional summary). Rounds are numbered,
//! strictly increasing per thread, never reused.
//!
//! ## Gates
//!
//! Boolean queries deciding whether a phase transition may proceed.
//! Level-triggered: every gate recomputes its answer from current state,
//! so a transition missed due to event ordering is re-evaluated correctly
//! on the next read.

pub mod core;
pub mod gate;
pub mod reset;
pub mod resumption;
pub mod round;
pub mod sequencer;
pub mod tracking;

// Re-export commonly used types
pub use self::core::error::DomainError;
pub use gate::{
    ConfigChangeGate, SEARCH_STALE_AFTER_MS, is_stale_unblock, should_wait_for_search,
};
pub use resumption::{ResumptionGuard, ResumptionKey};
pub use round::{
    CompletionReason, ConfigSnapshot, Participant, ParticipantId, ParticipantOutcome,
    RoundConfig, RoundMode, RoundPhase, RoundRecord, SearchRecord, StepStatus, SummaryRecord,
    ThreadState, current_timestamp_ms,
};
pub use sequencer::{all_accounted_for, all_terminal, any_in_progress, next_to_trigger};
pub use tracking::TrackingRegistry;
