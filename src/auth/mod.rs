//! Identity context - the current authenticated principal
//!
//! Exactly one live identity at a time. Login and registration atomically
//! replace both the in-memory user and the persisted snapshot; logout
//! atomically clears both. On construction a previously persisted snapshot
//! is restored if present and well-formed.
//!
//! The `following` set is written only through the crate-private setters
//! below, and only the social graph state calls them.

use crate::core::errors::AuthError;
use crate::core::types::CurrentUser;
use crate::gateway::{AuthGateway, GatewayError, TokenSource};
use crate::storage::IdentityStore;
use std::sync::RwLock;

pub struct IdentityContext {
    store: IdentityStore,
    current: RwLock<Option<CurrentUser>>,
}

impl IdentityContext {
    /// Restore a previously persisted identity if one exists.
    pub fn new(store: IdentityStore) -> Self {
        let current = store.load();
        if let Some(user) = &current {
            tracing::debug!("Restored identity for {}", user.email);
        }
        Self {
            store,
            current: RwLock::new(current),
        }
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.current.read().unwrap().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.read().unwrap().is_some()
    }

    pub async fn login(
        &self,
        gateway: &dyn AuthGateway,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, AuthError> {
        let session = gateway.login(email, password).await.map_err(|err| match err {
            GatewayError::Unauthorized(_) | GatewayError::NotFound(_) => {
                AuthError::InvalidCredentials
            }
            other => AuthError::Gateway(other),
        })?;
        let user = CurrentUser::from_session(session);
        self.replace(user.clone())?;
        Ok(user)
    }

    pub async fn register(
        &self,
        gateway: &dyn AuthGateway,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<CurrentUser, AuthError> {
        let session = gateway
            .register(email, password, first_name, last_name)
            .await
            .map_err(|err| match err {
                GatewayError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Gateway(other),
            })?;
        let user = CurrentUser::from_session(session);
        self.replace(user.clone())?;
        Ok(user)
    }

    /// Clear the identity from memory and disk. Infallible from the
    /// caller's point of view; a failed snapshot removal is logged.
    pub fn logout(&self) {
        let mut current = self.current.write().unwrap();
        if let Err(err) = self.store.clear() {
            tracing::warn!("Failed to clear identity snapshot: {}", err);
        }
        *current = None;
    }

    /// Replace the live identity, persisting under the write lock so no
    /// intermediate state is observable.
    fn replace(&self, user: CurrentUser) -> Result<(), AuthError> {
        let mut current = self.current.write().unwrap();
        self.store
            .save(&user)
            .map_err(|err| AuthError::Storage(err.to_string()))?;
        *current = Some(user);
        Ok(())
    }

    /// Record a confirmed follow. Social graph state only.
    pub(crate) fn insert_following(&self, user_id: &str) {
        let mut current = self.current.write().unwrap();
        if let Some(user) = current.as_mut() {
            // A user never follows itself.
            if user.id != user_id {
                user.following.insert(user_id.to_string());
            }
        }
    }

    /// Record a confirmed unfollow. Social graph state only.
    pub(crate) fn remove_following(&self, user_id: &str) {
        let mut current = self.current.write().unwrap();
        if let Some(user) = current.as_mut() {
            user.following.remove(user_id);
        }
    }

    /// Record a confirmed profile-picture change.
    pub(crate) fn set_profile_picture(&self, uri: Option<String>) {
        let mut current = self.current.write().unwrap();
        if let Some(user) = current.as_mut() {
            user.profile_picture = uri;
        }
    }
}

impl TokenSource for IdentityContext {
    fn bearer_token(&self) -> Option<String> {
        self.current
            .read()
            .unwrap()
            .as_ref()
            .map(|user| user.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AuthSession, UserAccount};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use tempfile::TempDir;

    struct StubAuth;

    #[async_trait]
    impl AuthGateway for StubAuth {
        async fn login(&self, email: &str, _password: &str) -> Result<AuthSession, GatewayError> {
            if email != "ada@example.com" {
                return Err(GatewayError::Unauthorized("invalid credentials".to_string()));
            }
            Ok(AuthSession {
                user: UserAccount {
                    id: "u1".to_string(),
                    first_name: "Ada".to_string(),
                    last_name: "Lovelace".to_string(),
                    email: email.to_string(),
                    profile_picture: None,
                    following: HashSet::new(),
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
            if email == "taken@example.com" {
                return Err(GatewayError::Conflict("email already registered".to_string()));
            }
            self.login("ada@example.com", password).await
        }
    }

    fn context(temp: &TempDir) -> IdentityContext {
        IdentityContext::new(IdentityStore::at(temp.path()).unwrap())
    }

    #[tokio::test]
    async fn test_login_sets_and_persists_identity() {
        let temp = TempDir::new().unwrap();
        let identity = context(&temp);
        assert!(!identity.is_logged_in());

        let user = identity.login(&StubAuth, "ada@example.com", "pw").await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(identity.bearer_token().as_deref(), Some("tok"));

        // A fresh context over the same store restores the session.
        let restored = context(&temp);
        assert_eq!(restored.current_user().map(|u| u.id), Some("u1".to_string()));
    }

    #[tokio::test]
    async fn test_bad_credentials_map_to_invalid_credentials() {
        let temp = TempDir::new().unwrap();
        let identity = context(&temp);

        let err = identity
            .login(&StubAuth, "mallory@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(!identity.is_logged_in());
    }

    #[tokio::test]
    async fn test_register_conflict_maps_to_email_taken() {
        let temp = TempDir::new().unwrap();
        let identity = context(&temp);

        let err = identity
            .register(&StubAuth, "taken@example.com", "pw", "Ada", "Lovelace")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_logout_clears_memory_and_disk() {
        let temp = TempDir::new().unwrap();
        let identity = context(&temp);
        identity.login(&StubAuth, "ada@example.com", "pw").await.unwrap();

        identity.logout();
        assert!(!identity.is_logged_in());
        assert!(identity.bearer_token().is_none());
        assert!(context(&temp).current_user().is_none());
    }

    #[tokio::test]
    async fn test_following_setters_guard_self_edges() {
        let temp = TempDir::new().unwrap();
        let identity = context(&temp);
        identity.login(&StubAuth, "ada@example.com", "pw").await.unwrap();

        identity.insert_following("u2");
        identity.insert_following("u1"); // own id, ignored
        let user = identity.current_user().unwrap();
        assert!(user.is_following("u2"));
        assert!(!user.is_following("u1"));

        identity.remove_following("u2");
        assert!(!identity.current_user().unwrap().is_following("u2"));
    }
}
