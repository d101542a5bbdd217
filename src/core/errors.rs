//! Domain error types
//!
//! Business-logic failures of the interaction engine, distinct from the
//! gateway's transport-level classification. A failed mutation never leaves
//! local state diverged from its pre-call value; these variants tell the
//! caller what happened and whether re-issuing the operation is safe.

use crate::gateway::GatewayError;
use thiserror::Error;

/// Errors from photo interactions and follow mutations
#[derive(Debug, Error)]
pub enum InteractionError {
    /// Rejected by local validation; no network call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Another mutation is already in flight for this entity.
    ///
    /// At most one like/follow mutation per entity is allowed at a time.
    /// Retry once the in-flight one resolves.
    #[error("A mutation is already in flight for this entity")]
    Busy,

    /// Ownership violation; no network call was made.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The entity is not held locally (never loaded, or already removed).
    #[error("Not loaded locally: {0}")]
    NotLoaded(String),

    /// The gateway call failed. Any optimistic change has been rolled back.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl InteractionError {
    /// Whether re-issuing the same operation is safe and may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            InteractionError::Gateway(err) => err.is_retryable(),
            _ => false,
        }
    }
}

/// Errors from login and registration
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    /// The identity snapshot could not be persisted.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
