//! Gates deciding whether a phase transition may proceed

pub mod config_change;
pub mod pre_search;

pub use config_change::ConfigChangeGate;
pub use pre_search::{SEARCH_STALE_AFTER_MS, is_stale_unblock, should_wait_for_search};
