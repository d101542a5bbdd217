//! Feed and gallery aggregation
//!
//! Ordered collections of photo URIs: the main feed and per-owner
//! galleries. This component is the only one that removes a photo from a
//! collection. Ordering is presentation order: the feed keeps the server's
//! order untouched; galleries reverse the server's oldest-first storage
//! order so the most recent upload comes first.
//!
//! Each collection carries a load generation. A load started earlier and
//! finishing after a newer one is stale; applying it is a no-op, which is
//! the "is this context still relevant" check for responses that outlive
//! the view that requested them.

use crate::core::types::Photo;
use dashmap::DashMap;
use std::sync::Arc;

/// Identifies one ordered collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionId {
    /// The main feed.
    Feed,
    /// A profile gallery, keyed by the owner's user id.
    Gallery(String),
}

/// Handle for one initiated load. A newer `begin_load` on the same
/// collection supersedes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadToken {
    collection: CollectionId,
    generation: u64,
}

#[derive(Debug, Default)]
struct Collection {
    uris: Vec<String>,
    generation: u64,
}

/// Feed/gallery aggregator state. Cheap to clone and share.
#[derive(Clone, Default)]
pub struct Collections {
    inner: Arc<DashMap<CollectionId, Collection>>,
}

impl Collections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load for `collection`, superseding any earlier in-flight one.
    pub fn begin_load(&self, collection: CollectionId) -> LoadToken {
        let mut entry = self.inner.entry(collection.clone()).or_default();
        entry.generation += 1;
        LoadToken {
            collection,
            generation: entry.generation,
        }
    }

    /// Whether a load started with `token` is still the latest one.
    pub fn is_current(&self, token: &LoadToken) -> bool {
        self.inner
            .get(&token.collection)
            .map(|entry| entry.generation == token.generation)
            .unwrap_or(false)
    }

    /// Apply a completed feed load, preserving the server's order. Returns
    /// false (and changes nothing) if the load was superseded.
    pub fn apply_feed(&self, token: &LoadToken, photos: &[Photo]) -> bool {
        self.apply(token, photos.iter().map(|photo| photo.uri.clone()).collect())
    }

    /// Apply a completed gallery load. The server lists oldest first; the
    /// presentation order is most recent first, so the sequence is reversed.
    pub fn apply_gallery(&self, token: &LoadToken, photos: &[Photo]) -> bool {
        self.apply(
            token,
            photos.iter().rev().map(|photo| photo.uri.clone()).collect(),
        )
    }

    fn apply(&self, token: &LoadToken, uris: Vec<String>) -> bool {
        let mut entry = self.inner.entry(token.collection.clone()).or_default();
        if entry.generation != token.generation {
            tracing::debug!("Discarding stale load for {:?}", token.collection);
            return false;
        }
        entry.uris = uris;
        true
    }

    /// The current presentation order of a collection.
    pub fn order(&self, collection: &CollectionId) -> Vec<String> {
        self.inner
            .get(collection)
            .map(|entry| entry.uris.clone())
            .unwrap_or_default()
    }

    /// Prepend a freshly uploaded photo (most-recent-first invariant).
    pub fn insert_photo(&self, collection: CollectionId, uri: &str) {
        let mut entry = self.inner.entry(collection).or_default();
        entry.uris.retain(|existing| existing != uri);
        entry.uris.insert(0, uri.to_string());
    }

    /// Remove `uri` from one collection. Idempotent: removing an absent
    /// URI is a no-op, not an error.
    pub fn remove_photo(&self, collection: &CollectionId, uri: &str) {
        if let Some(mut entry) = self.inner.get_mut(collection) {
            if let Some(position) = entry.uris.iter().position(|existing| existing == uri) {
                entry.uris.remove(position);
            }
        }
    }

    /// Remove `uri` from every collection containing it (confirmed delete).
    pub fn remove_everywhere(&self, uri: &str) {
        for mut entry in self.inner.iter_mut() {
            if let Some(position) = entry.uris.iter().position(|existing| existing == uri) {
                entry.uris.remove(position);
            }
        }
    }
}

/// A slot in a presentation grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridSlot<T> {
    Photo(T),
    /// Inert filler for grid alignment. Carries no identity, is never
    /// addressable, and is never persisted or sent to the gateway.
    Placeholder,
}

impl<T> GridSlot<T> {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, GridSlot::Placeholder)
    }

    pub fn photo(&self) -> Option<&T> {
        match self {
            GridSlot::Photo(photo) => Some(photo),
            GridSlot::Placeholder => None,
        }
    }
}

/// Pad a sequence up to the next multiple of 3 with placeholder slots for
/// presentation-grid alignment.
///
/// Pure and derived: recompute it whenever the source sequence changes;
/// never store the result as the canonical collection.
pub fn with_placeholders<T: Clone>(items: &[T]) -> Vec<GridSlot<T>> {
    let mut slots: Vec<GridSlot<T>> = items.iter().cloned().map(GridSlot::Photo).collect();
    let remainder = items.len() % 3;
    if remainder != 0 {
        for _ in 0..(3 - remainder) {
            slots.push(GridSlot::Placeholder);
        }
    }
    slots
}
