//! Error taxonomy for the telemetry core
//!
//! Poll failures are transient and never leave the scheduler. User action
//! errors abort the initiating action without touching existing state.
//! Stale poll results are not errors at all.

use crate::models::SubjectId;

/// Result alias for the telemetry core
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors surfaced by the telemetry core
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Network-level failure talking to the telemetry API
    #[error("request to telemetry API failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The telemetry API answered with a non-success status
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body did not match the expected shape
    #[error("failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    /// Invalid base URL or path
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Action rejected before any state was touched
    #[error(transparent)]
    UserAction(#[from] UserActionError),

    /// Pricing catalogue could not be loaded
    #[error("pricing catalogue error: {0}")]
    Pricing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    /// Whether a poll tick failing with this error should simply be retried next tick
    pub fn is_transient(&self) -> bool {
        match self {
            MonitorError::Transport(_) | MonitorError::Decode { .. } => true,
            MonitorError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Whether this error was caused by the initiating user action
    pub fn is_user_action(&self) -> bool {
        matches!(self, MonitorError::UserAction(_))
    }
}

/// Errors caused by invoking an action in a state that cannot satisfy it
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UserActionError {
    #[error("select a container first")]
    NoSubjectSelected,

    #[error("no benchmark recorded for container {0}; run a benchmark before predicting pricing")]
    BenchmarkRequired(SubjectId),

    #[error("duration must be a positive number of hours, got {0}")]
    InvalidHorizon(f64),
}
