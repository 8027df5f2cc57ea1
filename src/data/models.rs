//! Data models
//!
//! Rust structs representing database entities and the joined read models
//! served by the API. All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a timestamp in the fixed-width form stored in every `created_at`
/// column (`2024-01-05T10:00:00.000000Z`).
///
/// Fixed width keeps SQL string comparison and `ORDER BY` chronological.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// =============================================================================
// User
// =============================================================================

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Post
// =============================================================================

/// A post as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A post joined with its author's username and the derived counters
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostView {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
}

// =============================================================================
// Likes / Comments
// =============================================================================

/// Like relationship, unique per (user, post)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

/// A comment as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub post_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A comment joined with its author's username
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentView {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub post_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Auth tokens
// =============================================================================

/// Opaque login token; at most one per user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthToken {
    pub key: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}
