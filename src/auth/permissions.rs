//! Object-level permissions
//!
//! Anyone may read; only the owner may modify or delete.

use crate::data::{Comment, Post, User};
use crate::error::AppError;

/// An object with a single owning user
pub trait Owned {
    fn owner_id(&self) -> &str;
}

impl Owned for User {
    /// A user owns their own account
    fn owner_id(&self) -> &str {
        &self.id
    }
}

impl Owned for Post {
    fn owner_id(&self) -> &str {
        &self.author_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> &str {
        &self.author_id
    }
}

/// Fail with 403 unless `caller` owns `object`
pub fn ensure_owner(caller: &User, object: &impl Owned) -> Result<(), AppError> {
    if caller.id == object.owner_id() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
