use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// Failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected before any external call
    InvalidInput,
    /// Network failure, timeout or non-2xx status from a collaborator
    UpstreamUnavailable,
    /// Collaborator answered with a payload of the wrong shape
    InvalidResponse,
    /// Missing credential or endpoint; never retried
    ConfigurationError,
    /// One strategy of a multi-strategy operation failed
    PartialStrategyFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::ConfigurationError => "configuration_error",
            ErrorKind::PartialStrategyFailure => "partial_strategy_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error returned by buffered calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}
