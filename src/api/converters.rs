//! Conversion functions from service models to API DTOs

use crate::api::dto::*;
use crate::data::{CommentView, PostView};
use crate::error::AppError;
use crate::service::UserProfile;

/// Convert UserProfile to UserResponse
pub fn user_to_response(profile: UserProfile) -> UserResponse {
    UserResponse {
        id: profile.user.id,
        username: profile.user.username,
        created_at: profile.user.created_at,
        following_count: profile.following.len() as i64,
        following: profile.following,
        followers_count: profile.followers_count,
    }
}

/// Convert PostView to PostResponse
pub fn post_to_response(post: PostView) -> PostResponse {
    PostResponse {
        id: post.id,
        author: post.author_id,
        author_username: post.author_username,
        title: post.title,
        content: post.content,
        created_at: post.created_at,
        likes_count: post.likes_count,
        comments_count: post.comments_count,
    }
}

/// Convert CommentView to CommentResponse
pub fn comment_to_response(comment: CommentView) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post: comment.post_id,
        author: comment.author_id,
        author_username: comment.author_username,
        content: comment.content,
        created_at: comment.created_at,
    }
}

/// Unwrap a body field or fail with a "required" validation error
pub fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .ok_or_else(|| AppError::Validation(format!("{field}: This field is required.")))
}
