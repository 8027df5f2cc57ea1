//! Feed service
//!
//! Posts written by the users the caller follows, newest first.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

use crate::data::{Database, PostFilter, PostOrderField, PostView, User, parse_ordering, search_terms};
use crate::error::AppError;

use super::Listing;

/// Raw feed query parameters
#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub search: Option<String>,
    pub ordering: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive of the whole day
    pub end_date: Option<String>,
}

/// Parse a `YYYY-MM-DD` date; malformed input is treated as absent
fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
}

/// Midnight UTC of `date`, or `None` outside years 0000..=9999
///
/// Stored timestamps compare as fixed-width strings, which only holds for
/// four-digit years.
fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    (0..=9999)
        .contains(&date.year())
        .then(|| date.and_time(chrono::NaiveTime::MIN).and_utc())
}

impl FeedQuery {
    /// Translate into a post filter for `user_id`'s followees
    ///
    /// `start_date` becomes an inclusive bound at midnight UTC. `end_date`
    /// becomes an exclusive bound at midnight of the following day; when that
    /// day is past year 9999 the feed is left unbounded above.
    fn into_filter(self, user_id: &str) -> PostFilter {
        let created_from = parse_date(self.start_date.as_deref()).and_then(start_of_day);
        let created_before = parse_date(self.end_date.as_deref())
            .and_then(|date| date.checked_add_days(Days::new(1)))
            .and_then(start_of_day);

        PostFilter {
            search_terms: search_terms(self.search.as_deref()),
            followed_by: Some(user_id.to_string()),
            created_from,
            created_before,
            ordering: parse_ordering(self.ordering.as_deref(), PostOrderField::FEED),
        }
    }
}

/// Feed service
pub struct FeedService {
    db: Arc<Database>,
}

impl FeedService {
    /// Create new feed service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Caller's feed
    pub async fn feed(
        &self,
        caller: &User,
        query: FeedQuery,
        limit: usize,
        offset: usize,
    ) -> Result<Listing<PostView>, AppError> {
        let filter = query.into_filter(&caller.id);

        let total = self.db.count_posts(&filter).await?;
        let items = self.db.list_posts(&filter, limit, offset).await?;
        tracing::debug!(user_id = %caller.id, total, "Feed fetched");

        Ok(Listing { items, total })
    }
}
