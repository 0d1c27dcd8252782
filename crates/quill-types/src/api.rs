use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{LikeAction, ReportStatus, Role};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and the handlers. Canonical
/// definition lives here in quill-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Reader
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub token: String,
}

// -- Media --

/// A file attachment carried inside a JSON request body. `data` is the raw
/// file content, base64-encoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaUpload {
    pub filename: String,
    pub data: String,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub image: Option<MediaUpload>,
    pub video: Option<MediaUpload>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub author_id: Uuid,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
    pub likes: usize,
    pub dislikes: usize,
    pub comment_count: usize,
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

// -- Likes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LikeRequest {
    pub action: LikeAction,
}

#[derive(Debug, Serialize)]
pub struct LikeCountsResponse {
    pub likes: usize,
    pub dislikes: usize,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub content: String,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub recipient_id: Uuid,
    pub recipient_username: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// -- Social graph --

#[derive(Debug, Serialize)]
pub struct FriendEntry {
    pub user_id: Uuid,
    pub username: String,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    pub following: Vec<FriendEntry>,
    pub followers: Vec<FriendEntry>,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// -- Profiles --

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub profile_picture: String,
    pub bio: Option<String>,
    pub theme: String,
    pub followers_count: usize,
    pub following_count: usize,
    pub posts: Vec<PostResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub theme: Option<String>,
    pub profile_picture: Option<MediaUpload>,
}

// -- Reports / moderation --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReportRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: Uuid,
    pub reporter_username: String,
    pub reported_username: Option<String>,
    pub post_id: Option<Uuid>,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetReportStatusRequest {
    pub status: ReportStatus,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAdminRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

// -- Search --

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub posts: Vec<PostResponse>,
    pub users: Vec<UserSummary>,
}
