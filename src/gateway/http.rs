//! HTTP gateway implementation
//!
//! Thin reqwest-based client for the social REST API. Wire DTOs are private
//! to this module; everything crossing the boundary is a domain type or a
//! classified [`GatewayError`]. The bearer token is resolved per call
//! through the [`TokenSource`], so login/logout take effect immediately.

use super::{AuthGateway, GatewayError, SocialGateway, TokenSource};
use crate::config::ApiConfig;
use crate::core::types::{
    AuthSession, Comment, CommentAuthor, FollowCounters, Photo, PhotoDetails, UserAccount,
    UserProfile, UserSummary,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub struct HttpGateway {
    client: reqwest::Client,
    /// Base URL up to and including the API prefix, no trailing slash.
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl HttpGateway {
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid API base URL: {}", config.base_url))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn token(&self) -> Result<String, GatewayError> {
        self.tokens
            .bearer_token()
            .ok_or_else(|| GatewayError::Unauthorized("no active session".to_string()))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(GatewayError::from_network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::from_http_status(status, error_text));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(GatewayError::from_network_error)
    }

    fn image_part(bytes: Vec<u8>, file_name: &str) -> Result<reqwest::multipart::Part, GatewayError> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime.essence_str())
            .map_err(|e| GatewayError::InvalidInput(format!("Unusable content type: {}", e)))
    }
}

#[async_trait]
impl AuthGateway for HttpGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError> {
        let body = LoginBody { email, password };
        let dto: SessionDto = self
            .send_json(self.client.post(self.endpoint("auth/login")).json(&body))
            .await?;
        Ok(dto.into_session())
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthSession, GatewayError> {
        let body = RegisterBody {
            email,
            password,
            first_name,
            last_name,
        };
        let dto: SessionDto = self
            .send_json(self.client.post(self.endpoint("auth/register")).json(&body))
            .await?;
        Ok(dto.into_session())
    }
}

#[async_trait]
impl SocialGateway for HttpGateway {
    async fn like_photo(&self, uri: &str) -> Result<(), GatewayError> {
        let token = self.token()?;
        self.send(
            self.client
                .post(self.endpoint("profile/like-photo"))
                .bearer_auth(&token)
                .json(&PhotoUriBody { photo_uri: uri }),
        )
        .await?;
        Ok(())
    }

    async fn unlike_photo(&self, uri: &str) -> Result<(), GatewayError> {
        let token = self.token()?;
        self.send(
            self.client
                .post(self.endpoint("profile/unlike-photo"))
                .bearer_auth(&token)
                .json(&PhotoUriBody { photo_uri: uri }),
        )
        .await?;
        Ok(())
    }

    async fn add_comment(&self, uri: &str, text: &str) -> Result<Comment, GatewayError> {
        let token = self.token()?;
        let dto: CommentDto = self
            .send_json(
                self.client
                    .post(self.endpoint("profile/comment-photo"))
                    .bearer_auth(&token)
                    .json(&CommentBody {
                        photo_uri: uri,
                        comment: text,
                    }),
            )
            .await?;
        Ok(dto.into_comment())
    }

    async fn delete_photo(&self, uri: &str) -> Result<(), GatewayError> {
        let token = self.token()?;
        self.send(
            self.client
                .delete(self.endpoint("profile/delete-photo"))
                .bearer_auth(&token)
                .json(&PhotoUriBody { photo_uri: uri }),
        )
        .await?;
        Ok(())
    }

    async fn fetch_feed(&self) -> Result<Vec<Photo>, GatewayError> {
        let token = self.token()?;
        let dtos: Vec<PhotoDto> = self
            .send_json(
                self.client
                    .get(self.endpoint("profile/feed"))
                    .bearer_auth(&token),
            )
            .await?;
        Ok(dtos.into_iter().map(|dto| dto.into_photo(None)).collect())
    }

    async fn fetch_gallery(&self, owner_id: &str) -> Result<Vec<Photo>, GatewayError> {
        let token = self.token()?;
        let dto: GalleryDto = self
            .send_json(
                self.client
                    .get(self.endpoint(&format!("profile/photos/{}", owner_id)))
                    .bearer_auth(&token),
            )
            .await?;
        Ok(dto
            .photos
            .into_iter()
            .map(|photo| photo.into_photo(Some(owner_id)))
            .collect())
    }

    async fn photo_details(&self, uri: &str) -> Result<PhotoDetails, GatewayError> {
        let token = self.token()?;
        let dto: PhotoDetailsDto = self
            .send_json(
                self.client
                    .get(self.endpoint("profile/photo-details"))
                    .bearer_auth(&token)
                    .query(&[("photoUri", uri)]),
            )
            .await?;
        Ok(PhotoDetails {
            likes: dto.likes.into_iter().collect(),
            comments: dto.comments.into_iter().map(CommentDto::into_comment).collect(),
        })
    }

    async fn fetch_user(&self, user_id: &str) -> Result<UserProfile, GatewayError> {
        let token = self.token()?;
        let dto: AccountDto = self
            .send_json(
                self.client
                    .get(self.endpoint(&format!("profile/user/{}", user_id)))
                    .bearer_auth(&token),
            )
            .await?;
        Ok(UserProfile {
            id: dto.id,
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            profile_picture: dto.profile_picture,
        })
    }

    async fn fetch_counters(&self, user_id: &str) -> Result<FollowCounters, GatewayError> {
        let token = self.token()?;
        let dto: CountersDto = self
            .send_json(
                self.client
                    .get(self.endpoint(&format!("profile/counters/{}", user_id)))
                    .bearer_auth(&token),
            )
            .await?;
        Ok(FollowCounters {
            following: dto.following,
            followers: dto.followers,
        })
    }

    async fn follow(&self, user_id: &str) -> Result<(), GatewayError> {
        let token = self.token()?;
        self.send(
            self.client
                .post(self.endpoint("profile/follow"))
                .bearer_auth(&token)
                .json(&UserIdBody { user_id }),
        )
        .await?;
        Ok(())
    }

    async fn unfollow(&self, user_id: &str) -> Result<(), GatewayError> {
        let token = self.token()?;
        self.send(
            self.client
                .post(self.endpoint("profile/unfollow"))
                .bearer_auth(&token)
                .json(&UserIdBody { user_id }),
        )
        .await?;
        Ok(())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, GatewayError> {
        let token = self.token()?;
        let dtos: Vec<UserSummaryDto> = self
            .send_json(
                self.client
                    .get(self.endpoint("profile/search-users"))
                    .bearer_auth(&token)
                    .query(&[("q", query)]),
            )
            .await?;
        Ok(dtos.into_iter().map(UserSummaryDto::into_summary).collect())
    }

    async fn upload_photo(&self, bytes: Vec<u8>, file_name: &str) -> Result<String, GatewayError> {
        let token = self.token()?;
        let form =
            reqwest::multipart::Form::new().part("photo", Self::image_part(bytes, file_name)?);
        let dto: UploadPhotoDto = self
            .send_json(
                self.client
                    .post(self.endpoint("profile/upload-photo"))
                    .bearer_auth(&token)
                    .multipart(form),
            )
            .await?;
        Ok(dto.photo)
    }

    async fn upload_profile_picture(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<String, GatewayError> {
        let token = self.token()?;
        let form = reqwest::multipart::Form::new()
            .part("profilePicture", Self::image_part(bytes, file_name)?);
        let dto: UploadProfilePictureDto = self
            .send_json(
                self.client
                    .post(self.endpoint("profile/upload-profile-picture"))
                    .bearer_auth(&token)
                    .multipart(form),
            )
            .await?;
        Ok(dto.profile_picture)
    }

    async fn remove_profile_picture(&self) -> Result<(), GatewayError> {
        let token = self.token()?;
        self.send(
            self.client
                .delete(self.endpoint("profile/remove-profile-picture"))
                .bearer_auth(&token),
        )
        .await?;
        Ok(())
    }

    async fn fetch_profile_picture(&self) -> Result<Option<String>, GatewayError> {
        let token = self.token()?;
        let dto: ProfilePictureDto = self
            .send_json(
                self.client
                    .get(self.endpoint("profile/profile-picture"))
                    .bearer_auth(&token),
            )
            .await?;
        Ok(dto.profile_picture)
    }
}

// ---- Request bodies ----

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    email: &'a str,
    password: &'a str,
    first_name: &'a str,
    last_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PhotoUriBody<'a> {
    photo_uri: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentBody<'a> {
    photo_uri: &'a str,
    comment: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserIdBody<'a> {
    user_id: &'a str,
}

// ---- Response DTOs ----

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountDto {
    #[serde(rename = "_id")]
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    #[serde(default)]
    profile_picture: Option<String>,
    #[serde(default)]
    following: Vec<String>,
}

#[derive(Deserialize)]
struct SessionDto {
    user: AccountDto,
    token: String,
}

impl SessionDto {
    fn into_session(self) -> AuthSession {
        AuthSession {
            user: UserAccount {
                id: self.user.id,
                first_name: self.user.first_name,
                last_name: self.user.last_name,
                email: self.user.email,
                profile_picture: self.user.profile_picture,
                following: self.user.following.into_iter().collect(),
            },
            token: self.token,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSummaryDto {
    #[serde(rename = "_id")]
    id: String,
    first_name: String,
    last_name: String,
    #[serde(default)]
    profile_picture: Option<String>,
}

impl UserSummaryDto {
    fn into_summary(self) -> UserSummary {
        UserSummary {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            profile_picture: self.profile_picture,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentAuthorDto {
    first_name: String,
    last_name: String,
    #[serde(default)]
    profile_picture: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentDto {
    comment: String,
    user: CommentAuthorDto,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl CommentDto {
    fn into_comment(self) -> Comment {
        Comment {
            author: CommentAuthor {
                first_name: self.user.first_name,
                last_name: self.user.last_name,
                profile_picture: self.user.profile_picture,
            },
            text: self.comment,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
struct PhotoDto {
    uri: String,
    #[serde(default)]
    user: Option<UserSummaryDto>,
    #[serde(default)]
    likes: Vec<String>,
    #[serde(default)]
    comments: Vec<CommentDto>,
}

impl PhotoDto {
    /// Gallery listings may omit the embedded owner; the caller's owner id
    /// fills the gap so the delete ownership gate still works.
    fn into_photo(self, fallback_owner_id: Option<&str>) -> Photo {
        let owner = match (self.user, fallback_owner_id) {
            (Some(user), _) => user.into_summary(),
            (None, Some(owner_id)) => UserSummary::bare(owner_id),
            (None, None) => UserSummary::bare(""),
        };
        Photo {
            uri: self.uri,
            owner,
            likes: self.likes.into_iter().collect(),
            comments: self
                .comments
                .into_iter()
                .map(CommentDto::into_comment)
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct GalleryDto {
    #[serde(default)]
    photos: Vec<PhotoDto>,
}

#[derive(Deserialize)]
struct PhotoDetailsDto {
    #[serde(default)]
    likes: Vec<String>,
    #[serde(default)]
    comments: Vec<CommentDto>,
}

#[derive(Deserialize)]
struct CountersDto {
    following: u64,
    followers: u64,
}

#[derive(Deserialize)]
struct UploadPhotoDto {
    photo: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadProfilePictureDto {
    profile_picture: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePictureDto {
    #[serde(default)]
    profile_picture: Option<String>,
}
