//! Remote social gateway
//!
//! The boundary through which the core talks to the authoritative store.
//! Implementations return typed results or a classified [`GatewayError`];
//! no retries happen here - retry policy belongs to the caller, which also
//! owns any optimistic rollback.

mod error;
mod http;

// In-memory simulation gateway (feature-gated)
#[cfg(feature = "sim")]
pub mod sim;
#[cfg(feature = "sim")]
pub use sim::SimGateway;

pub use error::GatewayError;
pub use http::HttpGateway;

use crate::core::types::{
    AuthSession, Comment, FollowCounters, Photo, PhotoDetails, UserProfile, UserSummary,
};
use async_trait::async_trait;

/// Supplies the bearer token for authenticated calls.
///
/// Implemented by the identity context; a gateway resolves the token per
/// call so login/logout take effect without rebuilding the gateway.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Unauthenticated account endpoints.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError>;

    async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthSession, GatewayError>;
}

/// Authenticated social operations.
///
/// Every call resolves the current bearer token through a [`TokenSource`];
/// a missing token fails `Unauthorized` without touching the network.
#[async_trait]
pub trait SocialGateway: Send + Sync {
    /// Idempotent: liking an already-liked photo is safe.
    async fn like_photo(&self, uri: &str) -> Result<(), GatewayError>;

    /// Idempotent: unliking a not-liked photo is safe.
    async fn unlike_photo(&self, uri: &str) -> Result<(), GatewayError>;

    /// Returns the server-confirmed comment, author snapshot included.
    async fn add_comment(&self, uri: &str, text: &str) -> Result<Comment, GatewayError>;

    /// Owner-only; the server enforces ownership independently of the
    /// client-side gate.
    async fn delete_photo(&self, uri: &str) -> Result<(), GatewayError>;

    /// Most-recent-first, order defined by the server.
    async fn fetch_feed(&self) -> Result<Vec<Photo>, GatewayError>;

    /// Owner-scoped listing in server storage order (oldest first).
    async fn fetch_gallery(&self, owner_id: &str) -> Result<Vec<Photo>, GatewayError>;

    /// Likes and comments for one photo; the caller supplies URI and owner.
    async fn photo_details(&self, uri: &str) -> Result<PhotoDetails, GatewayError>;

    async fn fetch_user(&self, user_id: &str) -> Result<UserProfile, GatewayError>;

    async fn fetch_counters(&self, user_id: &str) -> Result<FollowCounters, GatewayError>;

    async fn follow(&self, user_id: &str) -> Result<(), GatewayError>;

    async fn unfollow(&self, user_id: &str) -> Result<(), GatewayError>;

    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, GatewayError>;

    /// Returns the URI the server assigned to the uploaded photo.
    async fn upload_photo(&self, bytes: Vec<u8>, file_name: &str) -> Result<String, GatewayError>;

    /// Returns the URI the server assigned to the new profile picture.
    async fn upload_profile_picture(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<String, GatewayError>;

    async fn remove_profile_picture(&self) -> Result<(), GatewayError>;

    async fn fetch_profile_picture(&self) -> Result<Option<String>, GatewayError>;
}
