//! Search and summary step records
//!
//! Both steps share the same status lifecycle but are semantically
//! independent: search runs before participants, summary after.

use serde::{Deserialize, Serialize};

/// Status of a search or summary step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    /// Created, not yet streaming
    Pending,
    /// Actively streaming
    Streaming,
    /// Finished with a result
    Complete,
    /// Finished without a result
    Failed,
}

impl StepStatus {
    /// Monotonic ordering for the "highest status wins" upsert.
    /// A late or duplicate creation call must never regress a record.
    fn rank(&self) -> u8 {
        match self {
            StepStatus::Pending => 0,
            StepStatus::Streaming => 1,
            StepStatus::Failed => 2,
            StepStatus::Complete => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Complete | StepStatus::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Streaming => "streaming",
            StepStatus::Complete => "complete",
            StepStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-round search record, keyed by round number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub round: u64,
    pub status: StepStatus,
    /// Milliseconds since epoch at creation, used for staleness checks
    pub created_at_ms: u64,
    /// Result payload, present only once complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl SearchRecord {
    /// Create the pending record staged atomically with round submission
    pub fn pending(round: u64, now_ms: u64) -> Self {
        Self {
            round,
            status: StepStatus::Pending,
            created_at_ms: now_ms,
            payload: None,
        }
    }

    /// Idempotent status upsert: only moves forward, never regresses.
    /// Returns whether the record changed.
    pub fn upsert_status(&mut self, status: StepStatus, payload: Option<serde_json::Value>) -> bool {
        if status.rank() <= self.status.rank() {
            return false;
        }
        self.status = status;
        if payload.is_some() {
            self.payload = payload;
        }
        true
    }

    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at_ms)
    }
}

/// Per-round summary record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub round: u64,
    pub status: StepStatus,
}

impl SummaryRecord {
    pub fn pending(round: u64) -> Self {
        Self {
            round,
            status: StepStatus::Pending,
        }
    }

    /// Same monotonic upsert as [`SearchRecord`]
    pub fn upsert_status(&mut self, status: StepStatus) -> bool {
        if status.rank() <= self.status.rank() {
            return false;
        }
        self.status = status;
        true
    }
}

/// Get current timestamp in milliseconds
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
