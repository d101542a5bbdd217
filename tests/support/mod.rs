//! Shared test support: a scripted gateway and client builders.
//!
//! `MockGateway` defaults to success with empty payloads. Tests queue
//! failures per operation, script response payloads, and can hold the next
//! mutation in flight to probe the re-entrancy guards.

#![allow(dead_code)]

use async_trait::async_trait;
use shutter::{
    AuthGateway, AuthSession, Comment, CommentAuthor, Config, CurrentUser, FollowCounters,
    GatewayError, IdentityContext, IdentityStore, Photo, PhotoDetails, SocialClient,
    SocialGateway, UserAccount, UserProfile, UserSummary,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;

#[derive(Default)]
pub struct MockGateway {
    failures: Mutex<HashMap<&'static str, VecDeque<GatewayError>>>,
    calls: Mutex<Vec<String>>,
    feed: Mutex<Vec<Photo>>,
    gallery: Mutex<Vec<Photo>>,
    profile: Mutex<Option<UserProfile>>,
    counters: Mutex<FollowCounters>,
    comment: Mutex<Option<Comment>>,
    following: Mutex<Vec<String>>,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for the next call of `op` ("like", "unlike",
    /// "comment", "delete", "follow", "unfollow", "fetch_feed", ...).
    pub fn fail_next(&self, op: &'static str, err: GatewayError) {
        self.failures
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(err);
    }

    /// Make the next like/unlike/follow/unfollow wait until the returned
    /// handle is notified.
    pub fn hold_next(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn set_feed(&self, photos: Vec<Photo>) {
        *self.feed.lock().unwrap() = photos;
    }

    pub fn set_gallery(&self, photos: Vec<Photo>) {
        *self.gallery.lock().unwrap() = photos;
    }

    pub fn set_profile(&self, profile: UserProfile) {
        *self.profile.lock().unwrap() = Some(profile);
    }

    pub fn set_counters(&self, counters: FollowCounters) {
        *self.counters.lock().unwrap() = counters;
    }

    pub fn set_comment(&self, comment: Comment) {
        *self.comment.lock().unwrap() = Some(comment);
    }

    /// Ids the session returned by login/register will already follow.
    pub fn set_following(&self, ids: &[&str]) {
        *self.following.lock().unwrap() = ids.iter().map(|id| id.to_string()).collect();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_failure(&self, op: &'static str) -> Option<GatewayError> {
        self.failures
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(|queue| queue.pop_front())
    }

    fn take_gate(&self) -> Option<Arc<Notify>> {
        self.hold.lock().unwrap().take()
    }

    async fn mutation(&self, op: &'static str, call: String) -> Result<(), GatewayError> {
        self.record(call);
        if let Some(gate) = self.take_gate() {
            gate.notified().await;
        }
        match self.take_failure(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthGateway for MockGateway {
    async fn login(&self, email: &str, _password: &str) -> Result<AuthSession, GatewayError> {
        self.record(format!("login {}", email));
        Ok(AuthSession {
            user: UserAccount {
                id: "u1".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: email.to_string(),
                profile_picture: None,
                following: self.following.lock().unwrap().iter().cloned().collect(),
            },
            token: "tok".to_string(),
        })
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        _first_name: &str,
        _last_name: &str,
    ) -> Result<AuthSession, GatewayError> {
        self.login(email, password).await
    }
}

#[async_trait]
impl SocialGateway for MockGateway {
    async fn like_photo(&self, uri: &str) -> Result<(), GatewayError> {
        self.mutation("like", format!("like {}", uri)).await
    }

    async fn unlike_photo(&self, uri: &str) -> Result<(), GatewayError> {
        self.mutation("unlike", format!("unlike {}", uri)).await
    }

    async fn add_comment(&self, uri: &str, text: &str) -> Result<Comment, GatewayError> {
        self.record(format!("comment {}", uri));
        if let Some(err) = self.take_failure("comment") {
            return Err(err);
        }
        Ok(self.comment.lock().unwrap().clone().unwrap_or(Comment {
            author: CommentAuthor {
                first_name: "Server".to_string(),
                last_name: "Echo".to_string(),
                profile_picture: None,
            },
            text: text.to_string(),
            created_at: chrono::Utc::now(),
        }))
    }

    async fn delete_photo(&self, uri: &str) -> Result<(), GatewayError> {
        self.mutation("delete", format!("delete {}", uri)).await
    }

    async fn fetch_feed(&self) -> Result<Vec<Photo>, GatewayError> {
        self.record("fetch_feed".to_string());
        if let Some(err) = self.take_failure("fetch_feed") {
            return Err(err);
        }
        Ok(self.feed.lock().unwrap().clone())
    }

    async fn fetch_gallery(&self, owner_id: &str) -> Result<Vec<Photo>, GatewayError> {
        self.record(format!("fetch_gallery {}", owner_id));
        Ok(self.gallery.lock().unwrap().clone())
    }

    async fn photo_details(&self, uri: &str) -> Result<PhotoDetails, GatewayError> {
        self.record(format!("photo_details {}", uri));
        Ok(PhotoDetails::default())
    }

    async fn fetch_user(&self, user_id: &str) -> Result<UserProfile, GatewayError> {
        self.record(format!("fetch_user {}", user_id));
        Ok(self
            .profile
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(UserProfile {
                id: user_id.to_string(),
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email: "grace@example.com".to_string(),
                profile_picture: None,
            }))
    }

    async fn fetch_counters(&self, user_id: &str) -> Result<FollowCounters, GatewayError> {
        self.record(format!("fetch_counters {}", user_id));
        Ok(*self.counters.lock().unwrap())
    }

    async fn follow(&self, user_id: &str) -> Result<(), GatewayError> {
        self.mutation("follow", format!("follow {}", user_id)).await
    }

    async fn unfollow(&self, user_id: &str) -> Result<(), GatewayError> {
        self.mutation("unfollow", format!("unfollow {}", user_id))
            .await
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, GatewayError> {
        self.record(format!("search {}", query));
        Ok(Vec::new())
    }

    async fn upload_photo(&self, _bytes: Vec<u8>, _file_name: &str) -> Result<String, GatewayError> {
        self.record("upload_photo".to_string());
        if let Some(err) = self.take_failure("upload_photo") {
            return Err(err);
        }
        Ok("/uploads/mock-1.jpg".to_string())
    }

    async fn upload_profile_picture(
        &self,
        _bytes: Vec<u8>,
        _file_name: &str,
    ) -> Result<String, GatewayError> {
        self.record("upload_profile_picture".to_string());
        Ok("/uploads/avatar-mock.jpg".to_string())
    }

    async fn remove_profile_picture(&self) -> Result<(), GatewayError> {
        self.record("remove_profile_picture".to_string());
        Ok(())
    }

    async fn fetch_profile_picture(&self) -> Result<Option<String>, GatewayError> {
        self.record("fetch_profile_picture".to_string());
        Ok(None)
    }
}

/// A client over a mock gateway, with its identity stored in a tempdir.
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn mock_client(gateway: Arc<MockGateway>) -> (SocialClient, TempDir) {
    let temp = TempDir::new().unwrap();
    let identity = Arc::new(IdentityContext::new(IdentityStore::at(temp.path()).unwrap()));
    let client = SocialClient::with_gateway(Config::default(), identity, gateway.clone(), gateway);
    (client, temp)
}

/// Log the mock user (Ada, id `u1`) in.
pub async fn login(client: &SocialClient) -> CurrentUser {
    client.login("ada@example.com", "pw").await.unwrap()
}

/// A feed photo owned by `owner_id` and liked by `likers`.
pub fn photo(uri: &str, owner_id: &str, likers: &[&str]) -> Photo {
    Photo {
        uri: uri.to_string(),
        owner: UserSummary {
            id: owner_id.to_string(),
            first_name: "Owner".to_string(),
            last_name: owner_id.to_uppercase(),
            profile_picture: None,
        },
        likes: likers.iter().map(|id| id.to_string()).collect::<HashSet<_>>(),
        comments: Vec::new(),
    }
}
