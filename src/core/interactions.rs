//! Photo interaction state machine
//!
//! Owns the per-photo mutable projection (like state, like count, comment
//! list) and the optimistic-update/rollback protocol for toggling likes and
//! posting comments.
//!
//! Like dimension per photo: `Idle -> Pending -> Idle`, where `Pending`
//! carries the captured pre-call snapshot and is the only non-terminal
//! state. A second like mutation while one is pending for the same photo is
//! rejected with `Busy`; this is the per-entity mutual-exclusion token that
//! prevents a double increment against a slow network. The pending check
//! and the optimistic apply happen under the projection's entry lock, which
//! is never held across an await.

use crate::auth::IdentityContext;
use crate::core::collections::Collections;
use crate::core::errors::InteractionError;
use crate::core::optimistic::{OptimisticMutation, OptimisticTarget};
use crate::core::types::{Comment, Photo, UserSummary};
use crate::gateway::SocialGateway;
use dashmap::DashMap;
use std::sync::Arc;

/// Like-dimension state for one photo.
#[derive(Debug, Default)]
enum LikeState {
    #[default]
    Idle,
    Pending(OptimisticMutation<LikeSnapshot>),
}

/// The rollback unit for a like mutation: both fields restore together.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LikeSnapshot {
    like_count: usize,
    liked_by_me: bool,
}

/// Locally held projection of one photo.
#[derive(Debug)]
struct PhotoProjection {
    uri: String,
    owner: UserSummary,
    like_count: usize,
    liked_by_me: bool,
    comments: Vec<Comment>,
    like: LikeState,
}

impl PhotoProjection {
    fn from_photo(photo: &Photo, current_user_id: Option<&str>) -> Self {
        Self {
            uri: photo.uri.clone(),
            owner: photo.owner.clone(),
            like_count: photo.like_count(),
            liked_by_me: current_user_id
                .map(|id| photo.liked_by(id))
                .unwrap_or(false),
            comments: photo.comments.clone(),
            like: LikeState::Idle,
        }
    }

    fn view(&self) -> PhotoView {
        PhotoView {
            uri: self.uri.clone(),
            owner: self.owner.clone(),
            like_count: self.like_count,
            liked_by_me: self.liked_by_me,
            comments: self.comments.clone(),
        }
    }
}

impl OptimisticTarget for PhotoProjection {
    type Snapshot = LikeSnapshot;

    fn snapshot(&self) -> LikeSnapshot {
        LikeSnapshot {
            like_count: self.like_count,
            liked_by_me: self.liked_by_me,
        }
    }

    fn restore(&mut self, snapshot: LikeSnapshot) {
        self.like_count = snapshot.like_count;
        self.liked_by_me = snapshot.liked_by_me;
    }
}

/// Read-only snapshot of a photo projection for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoView {
    pub uri: String,
    pub owner: UserSummary,
    pub like_count: usize,
    pub liked_by_me: bool,
    pub comments: Vec<Comment>,
}

/// The caller's explicit decision for a destructive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDecision {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// Per-photo interaction state, shared across views.
#[derive(Clone)]
pub struct PhotoInteractions {
    gateway: Arc<dyn SocialGateway>,
    identity: Arc<IdentityContext>,
    collections: Collections,
    photos: Arc<DashMap<String, PhotoProjection>>,
}

impl PhotoInteractions {
    pub fn new(
        gateway: Arc<dyn SocialGateway>,
        identity: Arc<IdentityContext>,
        collections: Collections,
    ) -> Self {
        Self {
            gateway,
            identity,
            collections,
            photos: Arc::new(DashMap::new()),
        }
    }

    /// Ingest server photos, replacing any local projection. The server
    /// snapshot is authoritative: a reload racing an in-flight optimistic
    /// change overwrites it, and the late confirmation applies nothing.
    pub fn ingest(&self, photos: &[Photo]) {
        let current = self.identity.current_user();
        let current_id = current.as_ref().map(|user| user.id.as_str());
        for photo in photos {
            self.photos.insert(
                photo.uri.clone(),
                PhotoProjection::from_photo(photo, current_id),
            );
        }
    }

    pub fn ingest_one(&self, photo: &Photo) {
        self.ingest(std::slice::from_ref(photo));
    }

    pub fn view(&self, uri: &str) -> Option<PhotoView> {
        self.photos.get(uri).map(|photo| photo.view())
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.photos.contains_key(uri)
    }

    /// Toggle the current user's like on `uri`.
    ///
    /// Optimistic-apply-then-confirm: the count and flag change before the
    /// gateway call; on failure both roll back to exactly their pre-call
    /// values and the classified error is surfaced, safe to retry by
    /// calling again. Returns the new liked state on success.
    pub async fn toggle_like(&self, uri: &str) -> Result<bool, InteractionError> {
        let liking = {
            let mut photo = self
                .photos
                .get_mut(uri)
                .ok_or_else(|| InteractionError::NotLoaded(uri.to_string()))?;
            if matches!(photo.like, LikeState::Pending(_)) {
                return Err(InteractionError::Busy);
            }
            let mutation = OptimisticMutation::begin(&*photo);
            let liking = !photo.liked_by_me;
            if liking {
                photo.like_count += 1;
            } else {
                photo.like_count = photo.like_count.saturating_sub(1);
            }
            photo.liked_by_me = liking;
            photo.like = LikeState::Pending(mutation);
            liking
        };

        let result = if liking {
            self.gateway.like_photo(uri).await
        } else {
            self.gateway.unlike_photo(uri).await
        };

        match result {
            Ok(()) => {
                if let Some(mut photo) = self.photos.get_mut(uri) {
                    if let LikeState::Pending(mutation) = std::mem::take(&mut photo.like) {
                        mutation.confirm();
                    }
                    // A reload may have replaced the projection mid-flight;
                    // the server snapshot already carries the final state.
                }
                Ok(liking)
            }
            Err(err) => {
                if let Some(mut photo) = self.photos.get_mut(uri) {
                    if let LikeState::Pending(mutation) = std::mem::take(&mut photo.like) {
                        mutation.roll_back(&mut *photo);
                        tracing::warn!("Like mutation for {} rolled back: {}", uri, err);
                    }
                }
                Err(err.into())
            }
        }
    }

    /// Post a comment on `uri`.
    ///
    /// Non-optimistic: comment identity and ordering are server-assigned,
    /// so the comment list changes only after the gateway confirms, and the
    /// author snapshot comes from the response. Empty or whitespace-only
    /// text is rejected locally without a network call; on failure the
    /// caller keeps the typed text for retry.
    pub async fn add_comment(&self, uri: &str, text: &str) -> Result<Comment, InteractionError> {
        if text.trim().is_empty() {
            return Err(InteractionError::InvalidInput(
                "comment text is empty".to_string(),
            ));
        }
        if !self.photos.contains_key(uri) {
            return Err(InteractionError::NotLoaded(uri.to_string()));
        }

        let comment = self.gateway.add_comment(uri, text).await?;
        if let Some(mut photo) = self.photos.get_mut(uri) {
            photo.comments.push(comment.clone());
        }
        Ok(comment)
    }

    /// Delete an owned photo behind an explicit confirm/cancel gate.
    ///
    /// A non-owner fails `Forbidden` without a network call. On confirmed
    /// deletion the photo is dropped locally and removed from every
    /// collection; on failure it remains everywhere.
    pub async fn delete_photo(
        &self,
        uri: &str,
        decision: DeleteDecision,
    ) -> Result<DeleteOutcome, InteractionError> {
        let owner_id = self
            .photos
            .get(uri)
            .map(|photo| photo.owner.id.clone())
            .ok_or_else(|| InteractionError::NotLoaded(uri.to_string()))?;
        let current = self
            .identity
            .current_user()
            .ok_or_else(|| InteractionError::Forbidden("no active session".to_string()))?;
        if owner_id != current.id {
            return Err(InteractionError::Forbidden(
                "only the owner can delete a photo".to_string(),
            ));
        }
        if decision == DeleteDecision::Cancelled {
            return Ok(DeleteOutcome::Cancelled);
        }

        self.gateway.delete_photo(uri).await?;
        self.photos.remove(uri);
        self.collections.remove_everywhere(uri);
        tracing::debug!("Deleted {} and removed it from all collections", uri);
        Ok(DeleteOutcome::Deleted)
    }
}
