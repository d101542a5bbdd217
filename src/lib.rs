//! shutter: photo-sharing social client
//!
//! This library provides:
//! - An identity context with a persisted login snapshot
//! - A typed gateway boundary over the social REST API (plus an in-memory
//!   simulation for tests)
//! - Per-photo interaction state machines with optimistic like toggling
//! - Social graph state owning the following set and follow counters
//! - Feed/gallery aggregation with placeholder-padded grid views

pub mod auth;
pub mod client;
pub mod config;
pub mod core;
pub mod gateway;
pub mod storage;

pub use auth::IdentityContext;
pub use client::SocialClient;
pub use config::Config;
pub use crate::core::collections::{
    with_placeholders, CollectionId, Collections, GridSlot, LoadToken,
};
pub use crate::core::errors::{AuthError, InteractionError};
pub use crate::core::interactions::{DeleteDecision, DeleteOutcome, PhotoInteractions, PhotoView};
pub use crate::core::social_graph::{ProfileView, SocialGraph};
pub use crate::core::types::{
    AuthSession, Comment, CommentAuthor, CurrentUser, FollowCounters, Photo, PhotoDetails,
    UserAccount, UserProfile, UserSummary,
};
pub use gateway::{AuthGateway, GatewayError, HttpGateway, SocialGateway, TokenSource};
pub use storage::IdentityStore;

#[cfg(feature = "sim")]
pub use gateway::SimGateway;
