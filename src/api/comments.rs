//! Comment endpoints

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::converters::{comment_to_response, required};
use super::dto::*;
use super::extract::ApiJson;
use super::pagination::{Page, PageParams};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::CommentService;

/// `?post=<id>` filter
#[derive(Debug, Default, Deserialize)]
pub struct CommentFilterParams {
    pub post: Option<String>,
}

/// GET /api/comments
pub async fn list_comments(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(page): Query<PageParams>,
    Query(filter): Query<CommentFilterParams>,
) -> Result<Json<Page<CommentResponse>>, AppError> {
    let window = page.window(&state.config.pagination)?;
    let post_id = filter.post.as_deref().filter(|id| !id.is_empty());
    let listing = CommentService::new(state.db.clone())
        .list(post_id, window.limit(), window.offset())
        .await?;

    Ok(Json(Page::build(
        listing.map(comment_to_response),
        window,
        &state.config.server.base_url(),
        &uri,
    )?))
}

/// POST /api/comments
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let post_id = required(&req.post, "post")?;
    let content = required(&req.content, "content")?;

    let comment = CommentService::new(state.db.clone())
        .create(&user, post_id, content)
        .await?;

    Ok((StatusCode::CREATED, Json(comment_to_response(comment))))
}

/// GET /api/comments/:id
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommentResponse>, AppError> {
    let comment = CommentService::new(state.db.clone()).get(&id).await?;

    Ok(Json(comment_to_response(comment)))
}

/// PUT or PATCH /api/comments/:id
///
/// Content is the only writable field, so both methods require it.
pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let content = required(&req.content, "content")?;

    let comment = CommentService::new(state.db.clone())
        .update(&user, &id, content)
        .await?;

    Ok(Json(comment_to_response(comment)))
}

/// DELETE /api/comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    CommentService::new(state.db.clone())
        .delete(&user, &id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
