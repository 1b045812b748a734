//! Application layer for roundtable
//!
//! Owns the async and stateful surface of round coordination: the
//! [`CompletionBarrier`](barrier::CompletionBarrier) synchronization
//! primitive, the [`RoundOrchestrator`](orchestrator::RoundOrchestrator)
//! phase machine, and the ports collaborators implement. The domain
//! crate supplies the pure gating and sequencing logic this layer
//! composes.

pub mod barrier;
pub mod orchestrator;
pub mod ports;

pub use barrier::{ACK_WAIT_CAP_MS, AckToken, CompletionBarrier};
pub use orchestrator::{OrchestratorError, RoundOrchestrator, STREAM_STALE_AFTER_MS};
pub use ports::{ErrorSource, NoObserver, RoundObserver};
