//! Account service
//!
//! Registration, profile management, the follow graph and token login.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::{ensure_owner, generate_token_key, hash_password_blocking, verify_password_blocking};
use crate::data::{AuthToken, Database, EntityId, User, search_terms};
use crate::error::AppError;
use crate::metrics::{POSTS_TOTAL, USERS_TOTAL};

use super::Listing;

const MAX_USERNAME_CHARS: usize = 150;

/// Trim and validate a username
///
/// Letters, digits and `@ . + - _` are allowed.
fn validate_username(raw: &str) -> Result<String, AppError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(AppError::Validation(
            "username: This field may not be blank.".to_string(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(AppError::Validation(format!(
            "username: Ensure this field has no more than {MAX_USERNAME_CHARS} characters."
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(AppError::Validation(
            "username: Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        ));
    }

    Ok(username.to_string())
}

/// A user together with their side of the follow graph
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user: User,
    /// IDs of the users this user follows
    pub following: Vec<String>,
    pub followers_count: i64,
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    min_password_length: usize,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>, min_password_length: usize) -> Self {
        Self {
            db,
            min_password_length,
        }
    }

    fn validate_password(&self, password: &str) -> Result<(), AppError> {
        if password.chars().count() < self.min_password_length {
            return Err(AppError::Validation(format!(
                "password: Ensure this field has at least {} characters.",
                self.min_password_length
            )));
        }
        Ok(())
    }

    /// Register a new user
    ///
    /// # Errors
    /// Validation error for a bad or taken username or a short password
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AppError> {
        let username = validate_username(username)?;
        self.validate_password(password)?;

        let user = User {
            id: EntityId::new().0,
            username,
            password_hash: hash_password_blocking(password.to_string()).await?,
            created_at: Utc::now(),
        };
        self.db.insert_user(&user).await?;
        USERS_TOTAL.inc();

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Attach following IDs and follower count to a user
    pub async fn profile(&self, user: User) -> Result<UserProfile, AppError> {
        let following = self.db.get_following_ids(&user.id).await?;
        let followers_count = self.db.count_followers(&user.id).await?;

        Ok(UserProfile {
            user,
            following,
            followers_count,
        })
    }

    /// List users, oldest first, optionally filtered by username substring
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Listing<UserProfile>, AppError> {
        let terms = search_terms(search);
        let total = self.db.count_users(&terms).await?;
        let users = self.db.list_users(&terms, limit, offset).await?;

        let mut items = Vec::with_capacity(users.len());
        for user in users {
            items.push(self.profile(user).await?);
        }

        Ok(Listing { items, total })
    }

    /// Get user by ID
    pub async fn get(&self, id: &str) -> Result<User, AppError> {
        self.db.get_user(id).await?.ok_or(AppError::NotFound)
    }

    /// Change username and/or password
    ///
    /// Only the account itself may do this. `None` leaves a field unchanged.
    pub async fn update(
        &self,
        caller: &User,
        id: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<User, AppError> {
        let target = self.get(id).await?;
        ensure_owner(caller, &target)?;

        let username = username.map(validate_username).transpose()?;
        let password_hash = match password {
            Some(password) => {
                self.validate_password(password)?;
                Some(hash_password_blocking(password.to_string()).await?)
            }
            None => None,
        };

        if !self
            .db
            .update_user(id, username.as_deref(), password_hash.as_deref())
            .await?
        {
            return Err(AppError::NotFound);
        }

        tracing::info!(user_id = %id, "User updated");

        self.get(id).await
    }

    /// Delete an account and everything it owns
    pub async fn delete(&self, caller: &User, id: &str) -> Result<(), AppError> {
        let target = self.get(id).await?;
        ensure_owner(caller, &target)?;

        if !self.db.delete_user(id).await? {
            return Err(AppError::NotFound);
        }
        USERS_TOTAL.dec();
        POSTS_TOTAL.set(self.db.count_all_posts().await?);

        tracing::info!(user_id = %id, username = %target.username, "User deleted");

        Ok(())
    }

    /// Follow another user
    ///
    /// # Returns
    /// The followed user
    pub async fn follow(&self, caller: &User, id: &str) -> Result<User, AppError> {
        let target = self.get(id).await?;
        if target.id == caller.id {
            return Err(AppError::Validation(
                "You cannot follow yourself.".to_string(),
            ));
        }

        if !self.db.insert_follow(&caller.id, &target.id).await? {
            return Err(AppError::Validation(
                "You are already following this user.".to_string(),
            ));
        }

        tracing::info!(follower = %caller.id, followee = %target.id, "Follow created");

        Ok(target)
    }

    /// Stop following a user
    ///
    /// # Returns
    /// The unfollowed user
    pub async fn unfollow(&self, caller: &User, id: &str) -> Result<User, AppError> {
        let target = self.get(id).await?;

        if !self.db.delete_follow(&caller.id, &target.id).await? {
            return Err(AppError::Validation(
                "You are not following this user.".to_string(),
            ));
        }

        tracing::info!(follower = %caller.id, followee = %target.id, "Follow removed");

        Ok(target)
    }

    /// Check credentials and return the user's token, creating it on first login
    ///
    /// # Returns
    /// `None` when the username is unknown or the password does not match
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<AuthToken>, AppError> {
        let Some(user) = self.db.get_user_by_username(username).await? else {
            tracing::warn!(%username, "Login failed: unknown username");
            return Ok(None);
        };

        if !verify_password_blocking(password.to_string(), user.password_hash.clone()).await? {
            tracing::warn!(%username, "Login failed: wrong password");
            return Ok(None);
        }

        let (token, created) = self
            .db
            .get_or_create_token(&user.id, &generate_token_key())
            .await?;
        tracing::info!(user_id = %user.id, created, "Login succeeded");

        Ok(Some(token))
    }

    /// Revoke the caller's token
    pub async fn logout(&self, caller: &User) -> Result<(), AppError> {
        let revoked = self.db.delete_token_for_user(&caller.id).await?;
        tracing::info!(user_id = %caller.id, revoked, "Logout");

        Ok(())
    }
}
