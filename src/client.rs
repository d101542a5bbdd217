//! Social client composition root
//!
//! Wires identity, gateway, photo interactions, social graph, and
//! collections together and exposes the screen-level flows: load the feed
//! or a gallery, open a photo, upload, and manage the profile picture.
//! Mutation semantics live in the core components; this layer only
//! orchestrates.

use crate::auth::IdentityContext;
use crate::config::Config;
use crate::core::collections::{with_placeholders, CollectionId, Collections, GridSlot};
use crate::core::errors::{AuthError, InteractionError};
use crate::core::interactions::{DeleteDecision, DeleteOutcome, PhotoInteractions, PhotoView};
use crate::core::social_graph::{ProfileView, SocialGraph};
use crate::core::types::{Comment, CurrentUser, FollowCounters, Photo, UserSummary};
use crate::gateway::{AuthGateway, GatewayError, HttpGateway, SocialGateway};
use crate::storage::IdentityStore;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct SocialClient {
    config: Config,
    identity: Arc<IdentityContext>,
    auth: Arc<dyn AuthGateway>,
    gateway: Arc<dyn SocialGateway>,
    collections: Collections,
    interactions: PhotoInteractions,
    graph: SocialGraph,
}

impl SocialClient {
    /// Build a client against the configured HTTP API, restoring any
    /// persisted identity.
    pub fn new(config: Config) -> Result<Self> {
        let identity = Arc::new(IdentityContext::new(IdentityStore::new()?));
        let gateway = Arc::new(HttpGateway::new(&config.api, identity.clone())?);
        Ok(Self::assemble(config, identity, gateway.clone(), gateway))
    }

    /// Build a client over explicit boundary implementations. Tests and
    /// the simulation gateway come in through here.
    pub fn with_gateway(
        config: Config,
        identity: Arc<IdentityContext>,
        auth: Arc<dyn AuthGateway>,
        gateway: Arc<dyn SocialGateway>,
    ) -> Self {
        Self::assemble(config, identity, auth, gateway)
    }

    fn assemble(
        config: Config,
        identity: Arc<IdentityContext>,
        auth: Arc<dyn AuthGateway>,
        gateway: Arc<dyn SocialGateway>,
    ) -> Self {
        let collections = Collections::new();
        let interactions =
            PhotoInteractions::new(gateway.clone(), identity.clone(), collections.clone());
        let graph = SocialGraph::new(gateway.clone(), identity.clone());
        Self {
            config,
            identity,
            auth,
            gateway,
            collections,
            interactions,
            graph,
        }
    }

    // ---- Identity ----

    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        self.identity.login(self.auth.as_ref(), email, password).await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<CurrentUser, AuthError> {
        self.identity
            .register(self.auth.as_ref(), email, password, first_name, last_name)
            .await
    }

    pub fn logout(&self) {
        self.identity.logout();
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.identity.current_user()
    }

    // ---- Feed and galleries ----

    /// Reload the main feed. The response replaces both the feed order and
    /// the per-photo projections unless a newer load superseded this one.
    pub async fn load_feed(&self) -> Result<Vec<PhotoView>, InteractionError> {
        let token = self.collections.begin_load(CollectionId::Feed);
        let photos = self.gateway.fetch_feed().await?;
        if self.collections.apply_feed(&token, &photos) {
            self.interactions.ingest(&photos);
        }
        Ok(self.feed())
    }

    /// Reload a user's gallery (most recent upload first).
    pub async fn load_gallery(&self, owner_id: &str) -> Result<Vec<PhotoView>, InteractionError> {
        let collection = CollectionId::Gallery(owner_id.to_string());
        let token = self.collections.begin_load(collection.clone());
        let photos = self.gateway.fetch_gallery(owner_id).await?;
        if self.collections.apply_gallery(&token, &photos) {
            self.interactions.ingest(&photos);
        }
        Ok(self.gallery(owner_id))
    }

    /// Load one photo's likes and comments. The caller supplies the owner
    /// reference, which the detail endpoint does not repeat.
    pub async fn load_photo(
        &self,
        uri: &str,
        owner: UserSummary,
    ) -> Result<PhotoView, InteractionError> {
        let details = self.gateway.photo_details(uri).await?;
        let photo = Photo {
            uri: uri.to_string(),
            owner,
            likes: details.likes,
            comments: details.comments,
        };
        self.interactions.ingest_one(&photo);
        self.interactions
            .view(uri)
            .ok_or_else(|| InteractionError::NotLoaded(uri.to_string()))
    }

    /// The feed in presentation order.
    pub fn feed(&self) -> Vec<PhotoView> {
        self.collection(&CollectionId::Feed)
    }

    /// A gallery in presentation order.
    pub fn gallery(&self, owner_id: &str) -> Vec<PhotoView> {
        self.collection(&CollectionId::Gallery(owner_id.to_string()))
    }

    /// A gallery padded with placeholder slots for a 3-column grid.
    pub fn gallery_grid(&self, owner_id: &str) -> Vec<GridSlot<PhotoView>> {
        with_placeholders(&self.gallery(owner_id))
    }

    pub fn photo(&self, uri: &str) -> Option<PhotoView> {
        self.interactions.view(uri)
    }

    fn collection(&self, collection: &CollectionId) -> Vec<PhotoView> {
        self.collections
            .order(collection)
            .iter()
            .filter_map(|uri| self.interactions.view(uri))
            .collect()
    }

    // ---- Photo interactions ----

    pub async fn toggle_like(&self, uri: &str) -> Result<bool, InteractionError> {
        self.interactions.toggle_like(uri).await
    }

    pub async fn add_comment(&self, uri: &str, text: &str) -> Result<Comment, InteractionError> {
        self.interactions.add_comment(uri, text).await
    }

    pub async fn delete_photo(
        &self,
        uri: &str,
        decision: DeleteDecision,
    ) -> Result<DeleteOutcome, InteractionError> {
        self.interactions.delete_photo(uri, decision).await
    }

    // ---- Social graph ----

    pub async fn load_profile(&self, user_id: &str) -> Result<ProfileView, InteractionError> {
        self.graph.load_profile(user_id).await
    }

    pub fn profile_view(&self, user_id: &str) -> Option<ProfileView> {
        self.graph.view(user_id)
    }

    pub async fn toggle_follow(&self, user_id: &str) -> Result<bool, InteractionError> {
        self.graph.toggle_follow(user_id).await
    }

    pub async fn own_counters(&self) -> Result<FollowCounters, InteractionError> {
        self.graph.own_counters().await
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, InteractionError> {
        Ok(self.gateway.search_users(query).await?)
    }

    // ---- Uploads and profile picture ----

    /// Upload a photo and prepend it to the uploader's gallery. Format and
    /// size are gated locally before any network call.
    pub async fn upload_photo(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<PhotoView, InteractionError> {
        let current = self.identity.current_user().ok_or_else(|| {
            InteractionError::Gateway(GatewayError::Unauthorized("no active session".to_string()))
        })?;
        self.check_upload(&bytes, file_name)?;

        let uri = self.gateway.upload_photo(bytes, file_name).await?;
        let photo = Photo {
            uri: uri.clone(),
            owner: current.summary(),
            likes: HashSet::new(),
            comments: Vec::new(),
        };
        self.interactions.ingest_one(&photo);
        self.collections
            .insert_photo(CollectionId::Gallery(current.id.clone()), &uri);
        self.interactions
            .view(&uri)
            .ok_or_else(|| InteractionError::NotLoaded(uri))
    }

    /// Upload a new profile picture; the confirmed URI lands on the live
    /// identity.
    pub async fn set_profile_picture(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<String, InteractionError> {
        self.check_upload(&bytes, file_name)?;
        let uri = self.gateway.upload_profile_picture(bytes, file_name).await?;
        self.identity.set_profile_picture(Some(uri.clone()));
        Ok(uri)
    }

    pub async fn remove_profile_picture(&self) -> Result<(), InteractionError> {
        self.gateway.remove_profile_picture().await?;
        self.identity.set_profile_picture(None);
        Ok(())
    }

    pub async fn profile_picture(&self) -> Result<Option<String>, InteractionError> {
        Ok(self.gateway.fetch_profile_picture().await?)
    }

    fn check_upload(&self, bytes: &[u8], file_name: &str) -> Result<(), InteractionError> {
        if bytes.is_empty() {
            return Err(InteractionError::InvalidInput("empty upload".to_string()));
        }
        if bytes.len() as u64 > self.config.upload.max_bytes {
            return Err(InteractionError::InvalidInput(format!(
                "upload exceeds {} bytes",
                self.config.upload.max_bytes
            )));
        }
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(InteractionError::InvalidInput(format!(
                "unsupported upload type: {}",
                mime
            )));
        }
        Ok(())
    }
}
