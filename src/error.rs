// =============================================================================
// Error kinds — Hedera Network Monitor
// =============================================================================
//
// Internal callers branch on these variants (rule lookups, validation,
// config loading); leaf I/O (gateway calls, HTTP requests, file access) uses
// `anyhow::Result` the same way the rest of the engine does. See §7 of the
// spec for the propagation policy each variant corresponds to.
// =============================================================================

use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the monitor's internal APIs.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("alert rule not found: {0}")]
    RuleNotFound(String),

    #[error("invalid alert rule: {0}")]
    RuleValidation(String),
}

impl MonitorError {
    /// Map this error to the HTTP status code the API layer should return
    /// for it, per §6.1.
    pub fn status_code(&self) -> StatusCode {
        match self {
            MonitorError::ConfigInvalid(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MonitorError::RuleNotFound(_) => StatusCode::NOT_FOUND,
            MonitorError::RuleValidation(_) => StatusCode::BAD_REQUEST,
        }
    }
}
