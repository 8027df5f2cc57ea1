//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services validate input, enforce ownership and orchestrate database calls.

mod account;
mod comment;
mod feed;
mod post;

pub use account::{AccountService, UserProfile};
pub use comment::CommentService;
pub use feed::{FeedQuery, FeedService};
pub use post::PostService;

/// One page of a list query plus the total number of matching rows
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Listing<T> {
    /// Convert every item, keeping the total
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Listing<U> {
        Listing {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
