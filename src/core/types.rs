//! Domain types for the social client core.
//!
//! These are the locally-held projections of server-owned entities. Wire
//! formats live with the gateway implementations; everything here is plain
//! data with serde derives for the identity snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The authenticated principal for the process lifetime.
///
/// Exactly one of these is live at a time, owned by the identity context.
/// `following` is written only by the social graph state; every other
/// component reads it through a clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    /// Ids of users this account follows. Never contains `id` itself.
    #[serde(default)]
    pub following: HashSet<String>,
    /// Bearer token attached to every authenticated gateway call.
    pub token: String,
}

impl CurrentUser {
    pub fn from_session(session: AuthSession) -> Self {
        let AuthSession { user, token } = session;
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            profile_picture: user.profile_picture,
            following: user.following,
            token,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.following.contains(user_id)
    }

    /// The owner reference this user's own photos carry.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }
}

/// Account data as returned by the auth endpoints, before the token is
/// attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub following: HashSet<String>,
}

/// Successful login/registration: the account plus its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: UserAccount,
    pub token: String,
}

/// Lightweight user reference: photo owners and search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl UserSummary {
    /// A summary carrying only the id, for listings that return bare photo
    /// URIs without an embedded owner. The ownership gate only needs the id.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            first_name: String::new(),
            last_name: String::new(),
            profile_picture: None,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Full profile of a viewed user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_picture: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }
}

/// A photo as the server describes it. Addressed by its stable URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub uri: String,
    pub owner: UserSummary,
    /// Ids of users who like this photo; its size is the like count.
    pub likes: HashSet<String>,
    /// Append-ordered; the server assigns the final order.
    pub comments: Vec<Comment>,
}

impl Photo {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn liked_by(&self, user_id: &str) -> bool {
        self.likes.contains(user_id)
    }
}

/// Likes and comments for a single photo, as returned by the detail endpoint
/// (the caller already knows the URI and owner).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhotoDetails {
    pub likes: HashSet<String>,
    pub comments: Vec<Comment>,
}

/// A comment on a photo. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: CommentAuthor,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// The commenter's identity frozen at comment time. Deliberately not a live
/// reference: a comment shows who its author was when it was posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl CommentAuthor {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Follow counters for a profile view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FollowCounters {
    pub following: u64,
    pub followers: u64,
}
