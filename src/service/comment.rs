//! Comment service

use std::sync::Arc;

use chrono::Utc;

use crate::auth::ensure_owner;
use crate::data::{Comment, CommentView, Database, EntityId, User};
use crate::error::AppError;

use super::Listing;
use super::post::validate_content;

/// Comment service
pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    /// Create new comment service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// List comments oldest first, optionally for one post
    pub async fn list(
        &self,
        post_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Listing<CommentView>, AppError> {
        let total = self.db.count_comments(post_id).await?;
        let items = self.db.list_comments(post_id, limit, offset).await?;

        Ok(Listing { items, total })
    }

    /// Comment on a post as the caller
    ///
    /// # Errors
    /// `NotFound` if the post does not exist
    pub async fn create(
        &self,
        caller: &User,
        post_id: &str,
        content: &str,
    ) -> Result<CommentView, AppError> {
        let content = validate_content(content)?;
        let post = self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;

        let comment = Comment {
            id: EntityId::new().0,
            author_id: caller.id.clone(),
            post_id: post.id,
            content,
            created_at: Utc::now(),
        };
        self.db.insert_comment(&comment).await?;

        tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "Comment created");

        self.get(&comment.id).await
    }

    /// Get comment by ID
    pub async fn get(&self, id: &str) -> Result<CommentView, AppError> {
        self.db.get_comment_view(id).await?.ok_or(AppError::NotFound)
    }

    /// Replace comment content; author only
    pub async fn update(&self, caller: &User, id: &str, content: &str) -> Result<CommentView, AppError> {
        let comment = self.db.get_comment(id).await?.ok_or(AppError::NotFound)?;
        ensure_owner(caller, &comment)?;

        let content = validate_content(content)?;
        if !self.db.update_comment(id, &content).await? {
            return Err(AppError::NotFound);
        }

        self.get(id).await
    }

    /// Delete a comment; author only
    pub async fn delete(&self, caller: &User, id: &str) -> Result<(), AppError> {
        let comment = self.db.get_comment(id).await?.ok_or(AppError::NotFound)?;
        ensure_owner(caller, &comment)?;

        if !self.db.delete_comment(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(comment_id = %id, "Comment deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Post;
    use tempfile::TempDir;

    async fn setup() -> (CommentService, Arc<Database>, User, User, Post, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-comment.db");
        let db = Arc::new(Database::connect(&db_path).await.unwrap());

        let mut users = Vec::new();
        for username in ["alice", "bob"] {
            let user = User {
                id: EntityId::new().0,
                username: username.to_string(),
                password_hash: "$argon2id$test".to_string(),
                created_at: Utc::now(),
            };
            db.insert_user(&user).await.unwrap();
            users.push(user);
        }
        let bob = users.pop().unwrap();
        let alice = users.pop().unwrap();

        let post = Post {
            id: EntityId::new().0,
            author_id: alice.id.clone(),
            title: "Hello".to_string(),
            content: "World".to_string(),
            created_at: Utc::now(),
        };
        db.insert_post(&post).await.unwrap();

        (CommentService::new(db.clone()), db, alice, bob, post, temp_dir)
    }

    #[tokio::test]
    async fn test_create_requires_existing_post() {
        let (service, _db, alice, _bob, post, _temp_dir) = setup().await;

        let comment = service.create(&alice, &post.id, "Nice").await.unwrap();
        assert_eq!(comment.post_id, post.id);
        assert_eq!(comment.author_username, "alice");

        assert!(matches!(
            service.create(&alice, "missing", "Nice").await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            service.create(&alice, &post.id, "   ").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_only_author_can_modify() {
        let (service, _db, alice, bob, post, _temp_dir) = setup().await;
        let comment = service.create(&bob, &post.id, "First").await.unwrap();

        assert!(matches!(
            service.update(&alice, &comment.id, "Edited").await,
            Err(AppError::Forbidden)
        ));
        let updated = service.update(&bob, &comment.id, "Edited").await.unwrap();
        assert_eq!(updated.content, "Edited");

        assert!(matches!(
            service.delete(&alice, &comment.id).await,
            Err(AppError::Forbidden)
        ));
        service.delete(&bob, &comment.id).await.unwrap();
        assert!(matches!(
            service.get(&comment.id).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_is_oldest_first() {
        let (service, _db, alice, bob, post, _temp_dir) = setup().await;
        let first = service.create(&alice, &post.id, "first").await.unwrap();
        let second = service.create(&bob, &post.id, "second").await.unwrap();

        let listing = service.list(Some(&post.id), 10, 0).await.unwrap();
        assert_eq!(listing.total, 2);
        assert_eq!(listing.items[0].id, first.id);
        assert_eq!(listing.items[1].id, second.id);

        let listing = service.list(Some("other-post"), 10, 0).await.unwrap();
        assert_eq!(listing.total, 0);
    }
}
