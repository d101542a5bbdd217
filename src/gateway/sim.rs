//! In-memory gateway simulation
//!
//! A complete [`SocialGateway`]/[`AuthGateway`] over an in-memory world.
//! No server required. Backs the end-to-end tests: register users, upload
//! photos, and exercise every social operation against authoritative state
//! the test can inspect. Semantics match the HTTP gateway's contract,
//! including idempotent like/follow and the self-follow conflict.

use super::{AuthGateway, GatewayError, SocialGateway, TokenSource};
use crate::core::types::{
    AuthSession, Comment, CommentAuthor, FollowCounters, Photo, PhotoDetails, UserAccount,
    UserProfile, UserSummary,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

const TOKEN_PREFIX: &str = "sim-token:";

pub struct SimGateway {
    tokens: Arc<dyn TokenSource>,
    state: Arc<Mutex<SimState>>,
}

#[derive(Default)]
struct SimState {
    users: HashMap<String, SimUser>,
    /// Upload order; galleries are served oldest-first like the real API.
    photos: Vec<SimPhoto>,
    next_user: u64,
    next_photo: u64,
}

struct SimUser {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    profile_picture: Option<String>,
    following: HashSet<String>,
}

impl SimUser {
    fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }

    fn comment_author(&self) -> CommentAuthor {
        CommentAuthor {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }
}

struct SimPhoto {
    uri: String,
    owner_id: String,
    likes: HashSet<String>,
    comments: Vec<Comment>,
}

impl SimPhoto {
    fn to_photo(&self, owner: UserSummary) -> Photo {
        Photo {
            uri: self.uri.clone(),
            owner,
            likes: self.likes.clone(),
            comments: self.comments.clone(),
        }
    }
}

impl SimGateway {
    pub fn new(tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            tokens,
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// A second gateway over the same world, authenticating a different
    /// caller. Lets tests drive several accounts against one state.
    pub fn shared_with(&self, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            tokens,
            state: Arc::clone(&self.state),
        }
    }

    /// Create an account directly, bypassing the auth flow. Test setup only.
    pub fn seed_user(&self, first_name: &str, last_name: &str, email: &str, password: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.insert_user(first_name, last_name, email, password)
    }

    /// The id of the account the current bearer token belongs to.
    fn caller(&self, state: &SimState) -> Result<String, GatewayError> {
        let token = self
            .tokens
            .bearer_token()
            .ok_or_else(|| GatewayError::Unauthorized("no active session".to_string()))?;
        let id = token
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| GatewayError::Unauthorized("unrecognized token".to_string()))?;
        if !state.users.contains_key(id) {
            return Err(GatewayError::Unauthorized("unknown account".to_string()));
        }
        Ok(id.to_string())
    }
}

impl SimState {
    fn insert_user(&mut self, first_name: &str, last_name: &str, email: &str, password: &str) -> String {
        self.next_user += 1;
        let id = format!("u{}", self.next_user);
        self.users.insert(
            id.clone(),
            SimUser {
                id: id.clone(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                profile_picture: None,
                following: HashSet::new(),
            },
        );
        id
    }

    fn user(&self, id: &str) -> Result<&SimUser, GatewayError> {
        self.users
            .get(id)
            .ok_or_else(|| GatewayError::NotFound(format!("user {}", id)))
    }

    fn photo_mut(&mut self, uri: &str) -> Result<&mut SimPhoto, GatewayError> {
        self.photos
            .iter_mut()
            .find(|photo| photo.uri == uri)
            .ok_or_else(|| GatewayError::NotFound(format!("photo {}", uri)))
    }

    fn session_for(&self, id: &str) -> AuthSession {
        let user = &self.users[id];
        AuthSession {
            user: UserAccount {
                id: user.id.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                email: user.email.clone(),
                profile_picture: user.profile_picture.clone(),
                following: user.following.clone(),
            },
            token: format!("{}{}", TOKEN_PREFIX, id),
        }
    }
}

#[async_trait]
impl AuthGateway for SimGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError> {
        let state = self.state.lock().unwrap();
        let user = state
            .users
            .values()
            .find(|user| user.email == email)
            .ok_or_else(|| GatewayError::Unauthorized("invalid credentials".to_string()))?;
        if user.password != password {
            return Err(GatewayError::Unauthorized("invalid credentials".to_string()));
        }
        let id = user.id.clone();
        Ok(state.session_for(&id))
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthSession, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.users.values().any(|user| user.email == email) {
            return Err(GatewayError::Conflict("email already registered".to_string()));
        }
        let id = state.insert_user(first_name, last_name, email, password);
        Ok(state.session_for(&id))
    }
}

#[async_trait]
impl SocialGateway for SimGateway {
    async fn like_photo(&self, uri: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        let caller = self.caller(&state)?;
        let photo = state.photo_mut(uri)?;
        photo.likes.insert(caller);
        Ok(())
    }

    async fn unlike_photo(&self, uri: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        let caller = self.caller(&state)?;
        let photo = state.photo_mut(uri)?;
        photo.likes.remove(&caller);
        Ok(())
    }

    async fn add_comment(&self, uri: &str, text: &str) -> Result<Comment, GatewayError> {
        if text.trim().is_empty() {
            return Err(GatewayError::InvalidInput("empty comment".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let caller = self.caller(&state)?;
        let author = state.user(&caller)?.comment_author();
        let comment = Comment {
            author,
            text: text.to_string(),
            created_at: chrono::Utc::now(),
        };
        state.photo_mut(uri)?.comments.push(comment.clone());
        Ok(comment)
    }

    async fn delete_photo(&self, uri: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        let caller = self.caller(&state)?;
        let photo = state.photo_mut(uri)?;
        if photo.owner_id != caller {
            return Err(GatewayError::Forbidden("not the owner".to_string()));
        }
        state.photos.retain(|photo| photo.uri != uri);
        Ok(())
    }

    async fn fetch_feed(&self) -> Result<Vec<Photo>, GatewayError> {
        let state = self.state.lock().unwrap();
        let caller = self.caller(&state)?;
        let following = &state.user(&caller)?.following;
        // Own photos plus followed users' photos, most recent first.
        Ok(state
            .photos
            .iter()
            .rev()
            .filter(|photo| photo.owner_id == caller || following.contains(&photo.owner_id))
            .filter_map(|photo| {
                state
                    .users
                    .get(&photo.owner_id)
                    .map(|owner| photo.to_photo(owner.summary()))
            })
            .collect())
    }

    async fn fetch_gallery(&self, owner_id: &str) -> Result<Vec<Photo>, GatewayError> {
        let state = self.state.lock().unwrap();
        self.caller(&state)?;
        let owner = state.user(owner_id)?.summary();
        Ok(state
            .photos
            .iter()
            .filter(|photo| photo.owner_id == owner_id)
            .map(|photo| photo.to_photo(owner.clone()))
            .collect())
    }

    async fn photo_details(&self, uri: &str) -> Result<PhotoDetails, GatewayError> {
        let mut state = self.state.lock().unwrap();
        self.caller(&state)?;
        let photo = state.photo_mut(uri)?;
        Ok(PhotoDetails {
            likes: photo.likes.clone(),
            comments: photo.comments.clone(),
        })
    }

    async fn fetch_user(&self, user_id: &str) -> Result<UserProfile, GatewayError> {
        let state = self.state.lock().unwrap();
        self.caller(&state)?;
        let user = state.user(user_id)?;
        Ok(UserProfile {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            profile_picture: user.profile_picture.clone(),
        })
    }

    async fn fetch_counters(&self, user_id: &str) -> Result<FollowCounters, GatewayError> {
        let state = self.state.lock().unwrap();
        self.caller(&state)?;
        let user = state.user(user_id)?;
        let followers = state
            .users
            .values()
            .filter(|candidate| candidate.following.contains(user_id))
            .count() as u64;
        Ok(FollowCounters {
            following: user.following.len() as u64,
            followers,
        })
    }

    async fn follow(&self, user_id: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        let caller = self.caller(&state)?;
        if caller == user_id {
            return Err(GatewayError::Conflict("cannot follow yourself".to_string()));
        }
        state.user(user_id)?;
        if let Some(user) = state.users.get_mut(&caller) {
            user.following.insert(user_id.to_string());
        }
        Ok(())
    }

    async fn unfollow(&self, user_id: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        let caller = self.caller(&state)?;
        if caller == user_id {
            return Err(GatewayError::Conflict("cannot unfollow yourself".to_string()));
        }
        if let Some(user) = state.users.get_mut(&caller) {
            user.following.remove(user_id);
        }
        Ok(())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, GatewayError> {
        let state = self.state.lock().unwrap();
        self.caller(&state)?;
        let needle = query.to_lowercase();
        let mut results: Vec<UserSummary> = state
            .users
            .values()
            .filter(|user| {
                format!("{} {}", user.first_name, user.last_name)
                    .to_lowercase()
                    .contains(&needle)
                    || user.email.to_lowercase().contains(&needle)
            })
            .map(SimUser::summary)
            .collect();
        results.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(results)
    }

    async fn upload_photo(&self, bytes: Vec<u8>, _file_name: &str) -> Result<String, GatewayError> {
        if bytes.is_empty() {
            return Err(GatewayError::InvalidInput("empty upload".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let caller = self.caller(&state)?;
        state.next_photo += 1;
        let uri = format!("/uploads/photo-{}.jpg", state.next_photo);
        state.photos.push(SimPhoto {
            uri: uri.clone(),
            owner_id: caller,
            likes: HashSet::new(),
            comments: Vec::new(),
        });
        Ok(uri)
    }

    async fn upload_profile_picture(
        &self,
        bytes: Vec<u8>,
        _file_name: &str,
    ) -> Result<String, GatewayError> {
        if bytes.is_empty() {
            return Err(GatewayError::InvalidInput("empty upload".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let caller = self.caller(&state)?;
        state.next_photo += 1;
        let uri = format!("/uploads/avatar-{}.jpg", state.next_photo);
        if let Some(user) = state.users.get_mut(&caller) {
            user.profile_picture = Some(uri.clone());
        }
        Ok(uri)
    }

    async fn remove_profile_picture(&self) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        let caller = self.caller(&state)?;
        if let Some(user) = state.users.get_mut(&caller) {
            user.profile_picture = None;
        }
        Ok(())
    }

    async fn fetch_profile_picture(&self) -> Result<Option<String>, GatewayError> {
        let state = self.state.lock().unwrap();
        let caller = self.caller(&state)?;
        Ok(state.user(&caller)?.profile_picture.clone())
    }
}
