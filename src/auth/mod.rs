//! Token authentication
//!
//! Handles:
//! - Password hashing
//! - Opaque token issuance
//! - Request authentication extractors
//! - Owner-only permissions

mod middleware;
pub mod password;
mod permissions;
mod token;

pub use middleware::CurrentUser;
pub use password::{hash_password_blocking, verify_password_blocking};
pub use permissions::{Owned, ensure_owner};
pub use token::generate_token_key;
