//! Search and ordering filters for list queries
//!
//! Filters are parsed from raw query-string values and rendered into SQL by
//! [`crate::data::Database`]. Column names never come from user input: only
//! whitelisted [`PostOrderField`] variants reach the `ORDER BY` clause.

use chrono::{DateTime, Utc};

/// Split a raw `search` parameter into lower-cased terms.
///
/// Terms are separated by whitespace or commas. Every term must match for a
/// row to be included.
pub fn search_terms(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|term| !term.is_empty())
            .map(|term| term.to_ascii_lowercase())
            .collect()
    })
    .unwrap_or_default()
}

/// Sortable post columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrderField {
    CreatedAt,
    LikesCount,
    CommentsCount,
}

impl PostOrderField {
    /// All fields orderable on the global post list
    pub const ALL: &'static [PostOrderField] = &[
        PostOrderField::CreatedAt,
        PostOrderField::LikesCount,
        PostOrderField::CommentsCount,
    ];

    /// Fields orderable on the feed
    pub const FEED: &'static [PostOrderField] = &[PostOrderField::CreatedAt];

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "created_at" => Some(Self::CreatedAt),
            "likes_count" => Some(Self::LikesCount),
            "comments_count" => Some(Self::CommentsCount),
            _ => None,
        }
    }

    /// SQL expression this field sorts by
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "p.created_at",
            Self::LikesCount => "likes_count",
            Self::CommentsCount => "comments_count",
        }
    }
}

/// One `ORDER BY` term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: PostOrderField,
    pub descending: bool,
}

impl OrderBy {
    /// Newest first
    pub const NEWEST_FIRST: OrderBy = OrderBy {
        field: PostOrderField::CreatedAt,
        descending: true,
    };
}

/// Parse an `ordering` parameter such as `-likes_count,created_at`.
///
/// Unknown or disallowed fields are dropped. When nothing valid remains the
/// result is newest-first.
pub fn parse_ordering(raw: Option<&str>, allowed: &[PostOrderField]) -> Vec<OrderBy> {
    let ordering: Vec<OrderBy> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter_map(|term| {
            let (descending, name) = match term.strip_prefix('-') {
                Some(name) => (true, name),
                None => (false, term),
            };
            let field = PostOrderField::from_name(name)?;
            allowed
                .contains(&field)
                .then_some(OrderBy { field, descending })
        })
        .collect();

    if ordering.is_empty() {
        vec![OrderBy::NEWEST_FIRST]
    } else {
        ordering
    }
}

/// Filter applied to post list queries
#[derive(Debug, Clone)]
pub struct PostFilter {
    /// Lower-cased terms; each must appear in the title or the content
    pub search_terms: Vec<String>,
    /// Restrict to posts authored by users this user follows
    pub followed_by: Option<String>,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub created_before: Option<DateTime<Utc>>,
    pub ordering: Vec<OrderBy>,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            search_terms: Vec::new(),
            followed_by: None,
            created_from: None,
            created_before: None,
            ordering: vec![OrderBy::NEWEST_FIRST],
        }
    }
}
