//! SQLite database operations
//!
//! All database access goes through this module.
//! Dynamic list queries (search, ordering, feed bounds) are assembled with
//! `QueryBuilder`; column names only ever come from whitelisted enums.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite};
use std::path::Path;
use std::time::Instant;

use super::filters::PostFilter;
use super::models::*;
use crate::error::AppError;
use crate::metrics::observe_db_query;

const POST_VIEW_SELECT: &str = r#"
    SELECT
        p.id,
        p.author_id,
        u.username AS author_username,
        p.title,
        p.content,
        p.created_at,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
    FROM posts p
    INNER JOIN users u ON u.id = p.author_id
    WHERE 1 = 1
"#;

const COMMENT_VIEW_SELECT: &str = r#"
    SELECT
        c.id,
        c.author_id,
        u.username AS author_username,
        c.post_id,
        c.content,
        c.created_at
    FROM comments c
    INNER JOIN users u ON u.id = c.author_id
    WHERE 1 = 1
"#;

/// Whether a sqlx error is a UNIQUE constraint violation
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_error) if db_error.is_unique_violation())
}

fn push_post_filter(query_builder: &mut QueryBuilder<'_, Sqlite>, filter: &PostFilter) {
    for term in &filter.search_terms {
        query_builder
            .push(" AND (instr(lower(p.title), ")
            .push_bind(term.clone())
            .push(") > 0 OR instr(lower(p.content), ")
            .push_bind(term.clone())
            .push(") > 0)");
    }

    if let Some(follower_id) = &filter.followed_by {
        query_builder
            .push(" AND p.author_id IN (SELECT followee_id FROM follows WHERE follower_id = ")
            .push_bind(follower_id.clone())
            .push(")");
    }

    if let Some(from) = &filter.created_from {
        query_builder
            .push(" AND p.created_at >= ")
            .push_bind(format_timestamp(from));
    }

    if let Some(before) = &filter.created_before {
        query_builder
            .push(" AND p.created_at < ")
            .push_bind(format_timestamp(before));
    }
}

fn push_post_ordering(query_builder: &mut QueryBuilder<'_, Sqlite>, filter: &PostFilter) {
    query_builder.push(" ORDER BY ");
    for order in &filter.ordering {
        query_builder.push(order.field.column()).push(if order.descending {
            " DESC, "
        } else {
            " ASC, "
        });
    }
    // Stable pagination across equal sort keys
    query_builder.push("p.id DESC");
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        Self::connect_with_pool_size(path, 5).await
    }

    /// Connect with an explicit upper bound on pooled connections.
    pub async fn connect_with_pool_size(
        path: &Path,
        max_connections: u32,
    ) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user
    ///
    /// # Errors
    /// Returns a validation error if the username is taken
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let started = Instant::now();
        let result = sqlx::query(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(format_timestamp(&user.created_at))
        .execute(&self.pool)
        .await;
        observe_db_query("INSERT", "users", started.elapsed());

        match result {
            Ok(_) => Ok(()),
            Err(error) if is_unique_violation(&error) => Err(AppError::Validation(
                "A user with that username already exists.".to_string(),
            )),
            Err(error) => Err(error.into()),
        }
    }

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by username (exact match)
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// List users, oldest account first
    ///
    /// # Arguments
    /// * `search_terms` - Lower-cased substrings the username must all contain
    /// * `limit` - Maximum number of results
    /// * `offset` - Offset for pagination
    pub async fn list_users(
        &self,
        search_terms: &[String],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<User>, AppError> {
        let started = Instant::now();
        let mut query_builder = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE 1 = 1");
        for term in search_terms {
            query_builder
                .push(" AND instr(lower(username), ")
                .push_bind(term.clone())
                .push(") > 0");
        }
        query_builder
            .push(" ORDER BY created_at ASC, id ASC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        let users = query_builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;
        observe_db_query("SELECT", "users", started.elapsed());

        Ok(users)
    }

    /// Count users matching the search terms
    pub async fn count_users(&self, search_terms: &[String]) -> Result<i64, AppError> {
        let mut query_builder =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users WHERE 1 = 1");
        for term in search_terms {
            query_builder
                .push(" AND instr(lower(username), ")
                .push_bind(term.clone())
                .push(") > 0");
        }

        let count = query_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Update username and/or password hash
    ///
    /// `None` leaves the column unchanged.
    ///
    /// # Returns
    /// `false` if no user has this ID
    pub async fn update_user(
        &self,
        id: &str,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = COALESCE(?, username),
                password_hash = COALESCE(?, password_hash)
            WHERE id = ?
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await;
        observe_db_query("UPDATE", "users", started.elapsed());

        match result {
            Ok(result) => Ok(result.rows_affected() > 0),
            Err(error) if is_unique_violation(&error) => Err(AppError::Validation(
                "A user with that username already exists.".to_string(),
            )),
            Err(error) => Err(error.into()),
        }
    }

    /// Delete user
    ///
    /// Posts, likes, comments, follow edges and the auth token go with it
    /// through `ON DELETE CASCADE`.
    pub async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        observe_db_query("DELETE", "users", started.elapsed());

        Ok(result.rows_affected() > 0)
    }

    /// Total number of users
    pub async fn count_all_users(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Follow relationships
    // =========================================================================

    /// Insert follow edge
    ///
    /// # Returns
    /// `false` if the edge already existed
    pub async fn insert_follow(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(format_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;
        observe_db_query("INSERT", "follows", started.elapsed());

        Ok(result.rows_affected() > 0)
    }

    /// Delete follow edge
    ///
    /// # Returns
    /// `false` if there was no such edge
    pub async fn delete_follow(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await?;
        observe_db_query("DELETE", "follows", started.elapsed());

        Ok(result.rows_affected() > 0)
    }

    /// Check if `follower_id` follows `followee_id`
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND followee_id = ?",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// IDs of users this user follows, oldest edge first
    pub async fn get_following_ids(&self, follower_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT followee_id FROM follows WHERE follower_id = ? ORDER BY created_at ASC",
        )
        .bind(follower_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Number of users following this user
    pub async fn count_followers(&self, user_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followee_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert post
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        let started = Instant::now();
        sqlx::query(
            "INSERT INTO posts (id, author_id, title, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(format_timestamp(&post.created_at))
        .execute(&self.pool)
        .await?;
        observe_db_query("INSERT", "posts", started.elapsed());

        Ok(())
    }

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Get post with author username and counters
    pub async fn get_post_view(&self, id: &str) -> Result<Option<PostView>, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new(POST_VIEW_SELECT);
        query_builder.push(" AND p.id = ").push_bind(id.to_string());

        let post = query_builder
            .build_query_as::<PostView>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Update post title and/or content
    ///
    /// # Returns
    /// `false` if no post has this ID
    pub async fn update_post(
        &self,
        id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = COALESCE(?, title),
                content = COALESCE(?, content)
            WHERE id = ?
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(id)
        .execute(&self.pool)
        .await?;
        observe_db_query("UPDATE", "posts", started.elapsed());

        Ok(result.rows_affected() > 0)
    }

    /// Delete post (likes and comments cascade)
    pub async fn delete_post(&self, id: &str) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        observe_db_query("DELETE", "posts", started.elapsed());

        Ok(result.rows_affected() > 0)
    }

    /// List posts matching a filter
    ///
    /// # Arguments
    /// * `filter` - Search terms, feed restriction, date bounds, ordering
    /// * `limit` - Maximum number of results
    /// * `offset` - Offset for pagination
    pub async fn list_posts(
        &self,
        filter: &PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostView>, AppError> {
        let started = Instant::now();
        let mut query_builder = QueryBuilder::<Sqlite>::new(POST_VIEW_SELECT);
        push_post_filter(&mut query_builder, filter);
        push_post_ordering(&mut query_builder, filter);
        query_builder
            .push(" LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        let posts = query_builder
            .build_query_as::<PostView>()
            .fetch_all(&self.pool)
            .await?;
        observe_db_query("SELECT", "posts", started.elapsed());

        Ok(posts)
    }

    /// Count posts matching a filter (ordering is ignored)
    pub async fn count_posts(&self, filter: &PostFilter) -> Result<i64, AppError> {
        let mut query_builder =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p WHERE 1 = 1");
        push_post_filter(&mut query_builder, filter);

        let count = query_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Total number of posts
    pub async fn count_all_posts(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Insert like unless this user already likes the post
    ///
    /// # Returns
    /// `false` if the like already existed
    pub async fn insert_like(&self, user_id: &str, post_id: &str) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO likes (id, user_id, post_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(EntityId::new().0)
        .bind(user_id)
        .bind(post_id)
        .bind(format_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;
        observe_db_query("INSERT", "likes", started.elapsed());

        Ok(result.rows_affected() > 0)
    }

    /// Delete like
    ///
    /// # Returns
    /// `false` if the post was not liked by this user
    pub async fn delete_like(&self, user_id: &str, post_id: &str) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        observe_db_query("DELETE", "likes", started.elapsed());

        Ok(result.rows_affected() > 0)
    }

    /// Likes recorded for a post
    pub async fn get_likes_for_post(&self, post_id: &str) -> Result<Vec<Like>, AppError> {
        let likes = sqlx::query_as::<_, Like>(
            "SELECT * FROM likes WHERE post_id = ? ORDER BY created_at ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(likes)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert comment
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        let started = Instant::now();
        sqlx::query(
            "INSERT INTO comments (id, author_id, post_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.author_id)
        .bind(&comment.post_id)
        .bind(&comment.content)
        .bind(format_timestamp(&comment.created_at))
        .execute(&self.pool)
        .await?;
        observe_db_query("INSERT", "comments", started.elapsed());

        Ok(())
    }

    /// Get comment by ID
    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Get comment with author username
    pub async fn get_comment_view(&self, id: &str) -> Result<Option<CommentView>, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new(COMMENT_VIEW_SELECT);
        query_builder.push(" AND c.id = ").push_bind(id.to_string());

        let comment = query_builder
            .build_query_as::<CommentView>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Update comment content
    pub async fn update_comment(&self, id: &str, content: &str) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = sqlx::query("UPDATE comments SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;
        observe_db_query("UPDATE", "comments", started.elapsed());

        Ok(result.rows_affected() > 0)
    }

    /// Delete comment
    pub async fn delete_comment(&self, id: &str) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        observe_db_query("DELETE", "comments", started.elapsed());

        Ok(result.rows_affected() > 0)
    }

    /// List comments, oldest first, optionally restricted to one post
    pub async fn list_comments(
        &self,
        post_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CommentView>, AppError> {
        let started = Instant::now();
        let mut query_builder = QueryBuilder::<Sqlite>::new(COMMENT_VIEW_SELECT);
        if let Some(post_id) = post_id {
            query_builder
                .push(" AND c.post_id = ")
                .push_bind(post_id.to_string());
        }
        query_builder
            .push(" ORDER BY c.created_at ASC, c.id ASC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        let comments = query_builder
            .build_query_as::<CommentView>()
            .fetch_all(&self.pool)
            .await?;
        observe_db_query("SELECT", "comments", started.elapsed());

        Ok(comments)
    }

    /// Count comments, optionally restricted to one post
    pub async fn count_comments(&self, post_id: Option<&str>) -> Result<i64, AppError> {
        let count: i64 = match post_id {
            Some(post_id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
                    .bind(post_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM comments")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(count)
    }

    // =========================================================================
    // Auth tokens
    // =========================================================================

    /// Return the user's token, inserting `candidate_key` if none exists
    ///
    /// # Returns
    /// The stored token and whether it was created by this call
    pub async fn get_or_create_token(
        &self,
        user_id: &str,
        candidate_key: &str,
    ) -> Result<(AuthToken, bool), AppError> {
        let started = Instant::now();
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO auth_tokens (key, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(candidate_key)
        .bind(user_id)
        .bind(format_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        let token =
            sqlx::query_as::<_, AuthToken>("SELECT * FROM auth_tokens WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        observe_db_query("UPSERT", "auth_tokens", started.elapsed());

        Ok((token, inserted))
    }

    /// Resolve a token key to its user
    pub async fn get_user_by_token(&self, key: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.*
            FROM users u
            INNER JOIN auth_tokens t ON t.user_id = u.id
            WHERE t.key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Delete the user's token
    ///
    /// # Returns
    /// `false` if the user had no token
    pub async fn delete_token_for_user(&self, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
