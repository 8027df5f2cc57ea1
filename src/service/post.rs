//! Post service
//!
//! Handles post operations including create, update, delete, like and unlike.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::ensure_owner;
use crate::data::{
    Database, EntityId, Post, PostFilter, PostOrderField, PostView, User, parse_ordering,
    search_terms,
};
use crate::error::AppError;
use crate::metrics::POSTS_TOTAL;

use super::Listing;

const MAX_TITLE_CHARS: usize = 255;

/// Trim and validate a post title
pub(crate) fn validate_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Validation(
            "title: This field may not be blank.".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(format!(
            "title: Ensure this field has no more than {MAX_TITLE_CHARS} characters."
        )));
    }
    Ok(title.to_string())
}

/// Trim and validate post or comment body text
pub(crate) fn validate_content(raw: &str) -> Result<String, AppError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(AppError::Validation(
            "content: This field may not be blank.".to_string(),
        ));
    }
    Ok(content.to_string())
}

/// Post service
pub struct PostService {
    db: Arc<Database>,
}

impl PostService {
    /// Create new post service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// List all posts
    ///
    /// # Arguments
    /// * `search` - Whitespace-separated terms matched against title and content
    /// * `ordering` - e.g. `-likes_count,created_at`; defaults to newest first
    pub async fn list(
        &self,
        search: Option<&str>,
        ordering: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Listing<PostView>, AppError> {
        let filter = PostFilter {
            search_terms: search_terms(search),
            ordering: parse_ordering(ordering, PostOrderField::ALL),
            ..PostFilter::default()
        };

        let total = self.db.count_posts(&filter).await?;
        let items = self.db.list_posts(&filter, limit, offset).await?;

        Ok(Listing { items, total })
    }

    /// Create a post authored by the caller
    pub async fn create(&self, caller: &User, title: &str, content: &str) -> Result<PostView, AppError> {
        let post = Post {
            id: EntityId::new().0,
            author_id: caller.id.clone(),
            title: validate_title(title)?,
            content: validate_content(content)?,
            created_at: Utc::now(),
        };
        self.db.insert_post(&post).await?;
        POSTS_TOTAL.inc();

        tracing::info!(post_id = %post.id, author = %caller.id, "Post created");

        self.get(&post.id).await
    }

    /// Get post by ID with author username and counters
    pub async fn get(&self, id: &str) -> Result<PostView, AppError> {
        self.db.get_post_view(id).await?.ok_or(AppError::NotFound)
    }

    /// Change title and/or content; author only
    pub async fn update(
        &self,
        caller: &User,
        id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<PostView, AppError> {
        let post = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;
        ensure_owner(caller, &post)?;

        let title = title.map(validate_title).transpose()?;
        let content = content.map(validate_content).transpose()?;

        if !self
            .db
            .update_post(id, title.as_deref(), content.as_deref())
            .await?
        {
            return Err(AppError::NotFound);
        }

        self.get(id).await
    }

    /// Delete a post; author only
    pub async fn delete(&self, caller: &User, id: &str) -> Result<(), AppError> {
        let post = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;
        ensure_owner(caller, &post)?;

        if !self.db.delete_post(id).await? {
            return Err(AppError::NotFound);
        }
        POSTS_TOTAL.dec();

        tracing::info!(post_id = %id, "Post deleted");

        Ok(())
    }

    // =========================================================================
    // Interactions
    // =========================================================================

    /// Like a post
    ///
    /// Liking an already liked post succeeds without adding a second like.
    pub async fn like(&self, caller: &User, id: &str) -> Result<(), AppError> {
        let post = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;

        let created = self.db.insert_like(&caller.id, &post.id).await?;
        tracing::debug!(post_id = %post.id, user_id = %caller.id, created, "Post liked");

        Ok(())
    }

    /// Remove the caller's like
    ///
    /// # Errors
    /// Validation error if the caller has not liked the post
    pub async fn unlike(&self, caller: &User, id: &str) -> Result<(), AppError> {
        let post = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;

        if !self.db.delete_like(&caller.id, &post.id).await? {
            return Err(AppError::Validation(
                "You have not liked this post.".to_string(),
            ));
        }
        tracing::debug!(post_id = %post.id, user_id = %caller.id, "Post unliked");

        Ok(())
    }
}
