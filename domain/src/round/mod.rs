//! Round domain: phases, participants, records, configuration

pub mod config;
pub mod entities;
pub mod participant;
pub mod phase;
pub mod record;

pub use config::{ConfigSnapshot, RoundConfig, RoundMode};
pub use entities::{RoundRecord, ThreadState};
pub use participant::{CompletionReason, Participant, ParticipantId, ParticipantOutcome};
pub use phase::RoundPhase;
pub use record::{SearchRecord, StepStatus, SummaryRecord, current_timestamp_ms};
