//! Typed errors for gateway operations
//!
//! Structured error classification so callers can decide between rollback,
//! retry, and surfacing without string matching.

use thiserror::Error;

/// Gateway operation errors with typed variants
///
/// Callers distinguish the failure modes as follows:
/// - `Unauthorized` (401) - missing/expired token; never retried here
/// - `Forbidden` (403) - ownership violation; never retried
/// - `NotFound` (404) - the entity no longer exists; roll back and surface
/// - `Conflict` (409) - entity-state mismatch; roll back and surface
/// - `InvalidInput` (400) - the server rejected the payload
/// - `Network` - connection/timeout; transient, safe to retry
/// - `Server` (5xx) - server-side issue; transient, safe to retry
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl GatewayError {
    /// Whether re-issuing the same call may succeed. Auth and entity-state
    /// failures are surfaced verbatim and never retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Network(_) | GatewayError::Server(_))
    }

    /// Convert an HTTP status code and error body into a typed error.
    ///
    /// Unrecognized statuses classify as `Server`; the taxonomy is closed.
    pub fn from_http_status(status: reqwest::StatusCode, error_text: String) -> Self {
        match status.as_u16() {
            400 => GatewayError::InvalidInput(error_text),
            401 => GatewayError::Unauthorized(error_text),
            403 => GatewayError::Forbidden(error_text),
            404 => GatewayError::NotFound(error_text),
            409 => GatewayError::Conflict(error_text),
            500..=599 => GatewayError::Server(error_text),
            _ => GatewayError::Server(format!("HTTP {}: {}", status, error_text)),
        }
    }

    /// Convert transport-level errors into typed errors.
    pub fn from_network_error(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            GatewayError::Network(format!("Connection failed: {}", e))
        } else if let Some(status) = e.status() {
            Self::from_http_status(status, e.to_string())
        } else {
            GatewayError::Network(e.to_string())
        }
    }
}
