//! Error types used throughout the pipeline
//!
//! Only [`PipelineError`] is ever returned to a caller of `send()`. The other
//! enums describe collaborator failures (transport, refresh, credential
//! storage, configuration) and are folded into `PipelineError` by the
//! pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::impl_str_conversions;

/// Classification of transport-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// The exchange did not complete before its deadline
    Timeout,
    /// Connection could not be established (DNS, refused, reset)
    Connect,
    /// Request could not be built or sent
    Request,
    /// Response body could not be read
    Body,
    /// URL was relative with no base URL, or otherwise unparsable
    InvalidUrl,
}

impl_str_conversions!(TransportErrorKind {
    Timeout => "timeout",
    Connect => "connect",
    Request => "request",
    Body => "body",
    InvalidUrl => "invalid_url",
});

/// A single HTTP exchange failed before a status line was received
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} failure: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(TransportErrorKind::Timeout, format!("no response after {after:?}"))
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::InvalidUrl, message)
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

/// Why a request ended with a terminal authorization failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum UnauthorizedReason {
    /// The refresh cycle failed; the session was cleared
    RefreshFailed(String),
    /// The request was replayed with a fresh credential and still rejected
    RetryRejected { status: u16 },
}

impl std::fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RefreshFailed(message) => write!(f, "credential refresh failed: {message}"),
            Self::RetryRejected { status } => {
                write!(f, "request rejected with status {status} after credential refresh")
            }
        }
    }
}

/// Categories of pipeline errors for caller-side retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transport failures - caller may retry
    Network,
    /// Session ended - caller must re-authenticate
    Authentication,
}

/// Outcome surfaced to callers of `send()` when no response is returned
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "error")]
pub enum PipelineError {
    #[error("Network failure: {0}")]
    NetworkFailure(#[from] TransportError),

    #[error("Unauthorized: {0}")]
    Unauthorized(UnauthorizedReason),
}

impl PipelineError {
    /// Get the error category for this error
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NetworkFailure(_) => ErrorCategory::Network,
            Self::Unauthorized(_) => ErrorCategory::Authentication,
        }
    }

    /// Whether the caller may reasonably retry the same request
    ///
    /// The pipeline itself never retries network failures.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        matches!(self.category(), ErrorCategory::Network)
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Credential persistence failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialStoreError {
    #[error("Credential storage access failed: {0}")]
    Access(String),

    #[error("Credential serialization failed: {0}")]
    Serialization(String),

    #[error("Credential file I/O failed: {0}")]
    Io(String),
}

impl From<serde_json::Error> for CredentialStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CredentialStoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Failures of a single refresh attempt
///
/// Never surfaced to callers directly; every variant ends the session and is
/// reported as [`UnauthorizedReason::RefreshFailed`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Refresh request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Refresh endpoint rejected the token with status {status}")]
    Rejected { status: u16, body: String },

    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),

    #[error("Refresh timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Store(#[from] CredentialStoreError),
}

/// Configuration loading and validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(String),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),

    #[error("Configuration file error: {0}")]
    File(String),

    #[error("Configuration parse error: {0}")]
    Parse(String),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let network = PipelineError::NetworkFailure(TransportError::timeout(
            Duration::from_secs(1),
        ));
        let unauthorized =
            PipelineError::Unauthorized(UnauthorizedReason::RetryRejected { status: 401 });

        assert_eq!(network.category(), ErrorCategory::Network);
        assert_eq!(unauthorized.category(), ErrorCategory::Authentication);
    }

    #[test]
    fn test_should_retry() {
        let network = PipelineError::NetworkFailure(TransportError::new(
            TransportErrorKind::Connect,
            "connection refused",
        ));
        let unauthorized =
            PipelineError::Unauthorized(UnauthorizedReason::RefreshFailed("expired".into()));

        assert!(network.should_retry());
        assert!(!unauthorized.should_retry());
        assert!(unauthorized.is_unauthorized());
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::new(TransportErrorKind::Connect, "connection reset");
        assert_eq!(err.to_string(), "connect failure: connection reset");
    }

    #[test]
    fn test_unauthorized_reason_display() {
        let reason = UnauthorizedReason::RetryRejected { status: 403 };
        assert!(reason.to_string().contains("403"));

        let reason = UnauthorizedReason::RefreshFailed("invalid_grant".into());
        assert!(reason.to_string().contains("invalid_grant"));
    }

    #[test]
    fn test_refresh_error_from_transport() {
        let err: RefreshError = TransportError::timeout(Duration::from_millis(5)).into();
        assert!(matches!(err, RefreshError::Transport(ref t) if t.is_timeout()));
    }

    #[test]
    fn test_store_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CredentialStoreError = io.into();
        assert!(matches!(err, CredentialStoreError::Io(_)));
    }

    #[test]
    fn test_pipeline_error_serializes_with_type_tag() {
        let err = PipelineError::Unauthorized(UnauthorizedReason::RetryRejected { status: 401 });
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "Unauthorized");
    }
}
