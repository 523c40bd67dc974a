// =============================================================================
// hedera-network-monitor
// =============================================================================
//
// A standalone service that samples operational metrics from a distributed
// ledger network, evaluates them against user-defined alert rules, and
// dispatches webhook notifications. See `config.rs` for the on-disk schema
// and `state.rs` for how the pieces below are wired together at startup.
// =============================================================================

pub mod alert_engine;
pub mod api;
pub mod collector;
pub mod config;
pub mod error;
pub mod gateway;
pub mod metric_store;
pub mod state;
pub mod types;
pub mod webhook;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current UNIX time in seconds. Centralized so every timestamped record in
/// the crate stamps consistently and so tests have one place to reason about.
pub fn now_unix_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
