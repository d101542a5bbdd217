//! Social graph state
//!
//! Owns the current user's following set and the follow projections of
//! viewed profiles. Follow toggling mirrors the photo like protocol:
//! optimistic apply, confirm or roll back, one in-flight mutation per user.
//! All writes to `CurrentUser.following` go through here and land in the
//! identity context only after the gateway confirms; outside the in-flight
//! window, `is_following == (user_id ∈ current_user.following)` holds.

use crate::auth::IdentityContext;
use crate::core::errors::InteractionError;
use crate::core::optimistic::{OptimisticMutation, OptimisticTarget};
use crate::core::types::{FollowCounters, UserProfile};
use crate::gateway::{GatewayError, SocialGateway};
use dashmap::DashMap;
use std::sync::Arc;

/// Follow-dimension state for one viewed user.
#[derive(Debug, Default)]
enum FollowState {
    #[default]
    Idle,
    Pending(OptimisticMutation<FollowSnapshot>),
}

/// The rollback unit for a follow mutation: the flag and the viewed user's
/// follower counter revert together, never separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FollowSnapshot {
    is_following: bool,
    followers: u64,
}

#[derive(Debug)]
struct FollowProjection {
    user: UserProfile,
    counters: FollowCounters,
    is_following: bool,
    state: FollowState,
}

impl FollowProjection {
    fn view(&self) -> ProfileView {
        ProfileView {
            user: self.user.clone(),
            counters: self.counters,
            is_following: self.is_following,
        }
    }
}

impl OptimisticTarget for FollowProjection {
    type Snapshot = FollowSnapshot;

    fn snapshot(&self) -> FollowSnapshot {
        FollowSnapshot {
            is_following: self.is_following,
            followers: self.counters.followers,
        }
    }

    fn restore(&mut self, snapshot: FollowSnapshot) {
        self.is_following = snapshot.is_following;
        self.counters.followers = snapshot.followers;
    }
}

/// Read-only snapshot of a viewed profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub user: UserProfile,
    pub counters: FollowCounters,
    pub is_following: bool,
}

/// Follow state for viewed profiles, shared across views.
#[derive(Clone)]
pub struct SocialGraph {
    gateway: Arc<dyn SocialGateway>,
    identity: Arc<IdentityContext>,
    profiles: Arc<DashMap<String, FollowProjection>>,
}

impl SocialGraph {
    pub fn new(gateway: Arc<dyn SocialGateway>, identity: Arc<IdentityContext>) -> Self {
        Self {
            gateway,
            identity,
            profiles: Arc::new(DashMap::new()),
        }
    }

    /// Load a user's profile and counters, replacing any local projection
    /// (the server snapshot is authoritative).
    pub async fn load_profile(&self, user_id: &str) -> Result<ProfileView, InteractionError> {
        let user = self.gateway.fetch_user(user_id).await?;
        let counters = self.gateway.fetch_counters(user_id).await?;
        let is_following = self
            .identity
            .current_user()
            .map(|current| current.is_following(user_id))
            .unwrap_or(false);

        let projection = FollowProjection {
            user,
            counters,
            is_following,
            state: FollowState::Idle,
        };
        let view = projection.view();
        self.profiles.insert(user_id.to_string(), projection);
        Ok(view)
    }

    pub fn view(&self, user_id: &str) -> Option<ProfileView> {
        self.profiles.get(user_id).map(|profile| profile.view())
    }

    /// The current user's own counters.
    pub async fn own_counters(&self) -> Result<FollowCounters, InteractionError> {
        let current = self.identity.current_user().ok_or_else(|| {
            InteractionError::Gateway(GatewayError::Unauthorized("no active session".to_string()))
        })?;
        Ok(self.gateway.fetch_counters(&current.id).await?)
    }

    /// Toggle following `user_id`.
    ///
    /// Flips the local flag and adjusts the viewed user's follower counter
    /// immediately, then confirms via the gateway. On failure both revert
    /// atomically. Self-follow fails `InvalidInput` without a network call;
    /// a second toggle while one is in flight for the same user is `Busy`.
    /// Returns the new following state on success.
    pub async fn toggle_follow(&self, user_id: &str) -> Result<bool, InteractionError> {
        let current = self.identity.current_user().ok_or_else(|| {
            InteractionError::Gateway(GatewayError::Unauthorized("no active session".to_string()))
        })?;
        if current.id == user_id {
            return Err(InteractionError::InvalidInput(
                "cannot follow yourself".to_string(),
            ));
        }

        let following = {
            let mut profile = self
                .profiles
                .get_mut(user_id)
                .ok_or_else(|| InteractionError::NotLoaded(user_id.to_string()))?;
            if matches!(profile.state, FollowState::Pending(_)) {
                return Err(InteractionError::Busy);
            }
            let mutation = OptimisticMutation::begin(&*profile);
            let following = !profile.is_following;
            profile.is_following = following;
            if following {
                profile.counters.followers += 1;
            } else {
                profile.counters.followers = profile.counters.followers.saturating_sub(1);
            }
            profile.state = FollowState::Pending(mutation);
            following
        };

        let result = if following {
            self.gateway.follow(user_id).await
        } else {
            self.gateway.unfollow(user_id).await
        };

        match result {
            Ok(()) => {
                if let Some(mut profile) = self.profiles.get_mut(user_id) {
                    if let FollowState::Pending(mutation) = std::mem::take(&mut profile.state) {
                        mutation.confirm();
                    }
                }
                // The only writes to the identity's following set.
                if following {
                    self.identity.insert_following(user_id);
                } else {
                    self.identity.remove_following(user_id);
                }
                Ok(following)
            }
            Err(err) => {
                if let Some(mut profile) = self.profiles.get_mut(user_id) {
                    if let FollowState::Pending(mutation) = std::mem::take(&mut profile.state) {
                        mutation.roll_back(&mut *profile);
                        tracing::warn!("Follow mutation for {} rolled back: {}", user_id, err);
                    }
                }
                Err(err.into())
            }
        }
    }
}
