//! Request and response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Responses
// =============================================================================

/// User as returned by the account endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    /// IDs of the users this user follows
    pub following: Vec<String>,
    pub followers_count: i64,
    pub following_count: i64,
}

/// Post with author username and derived counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    /// Author user ID
    pub author: String,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
}

/// Comment with author username
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    /// Post ID
    pub post: String,
    /// Author user ID
    pub author: String,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// `{"message": ...}` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Registration body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Account update body; PUT requires both fields, PATCH either
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login body
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Post create/update body
#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Comment create body
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post: Option<String>,
    pub content: Option<String>,
}

/// Comment update body
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
}

/// `search` and `ordering` list parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub ordering: Option<String>,
}
