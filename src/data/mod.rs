//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Entity and read models
//! - Search/ordering filters for list queries

mod database;
mod filters;
mod models;

pub use database::{Database, is_unique_violation};
pub use filters::{OrderBy, PostFilter, PostOrderField, parse_ordering, search_terms};
pub use models::*;
