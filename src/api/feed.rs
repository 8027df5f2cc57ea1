//! Feed endpoint

use axum::{
    extract::{OriginalUri, Query, State},
    response::Json,
};
use serde::Deserialize;

use super::converters::post_to_response;
use super::dto::PostResponse;
use super::pagination::{Page, PageParams};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::{FeedQuery, FeedService};

/// Feed query parameters
#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<FeedParams> for FeedQuery {
    fn from(params: FeedParams) -> Self {
        FeedQuery {
            search: params.search,
            ordering: params.ordering,
            start_date: params.start_date,
            end_date: params.end_date,
        }
    }
}

/// GET /api/feed
///
/// Posts by the users the caller follows.
pub async fn feed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(page): Query<PageParams>,
    Query(params): Query<FeedParams>,
) -> Result<Json<Page<PostResponse>>, AppError> {
    let window = page.window(&state.config.pagination)?;
    let listing = FeedService::new(state.db.clone())
        .feed(&user, params.into(), window.limit(), window.offset())
        .await?;

    Ok(Json(Page::build(
        listing.map(post_to_response),
        window,
        &state.config.server.base_url(),
        &uri,
    )?))
}
