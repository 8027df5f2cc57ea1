//! Post endpoints

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::Json,
};

use super::converters::{post_to_response, required};
use super::dto::*;
use super::extract::ApiJson;
use super::pagination::{Page, PageParams};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::PostService;

/// GET /api/posts
pub async fn list_posts(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(page): Query<PageParams>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<PostResponse>>, AppError> {
    let window = page.window(&state.config.pagination)?;
    let listing = PostService::new(state.db.clone())
        .list(
            params.search.as_deref(),
            params.ordering.as_deref(),
            window.limit(),
            window.offset(),
        )
        .await?;

    Ok(Json(Page::build(
        listing.map(post_to_response),
        window,
        &state.config.server.base_url(),
        &uri,
    )?))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<PostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let title = required(&req.title, "title")?;
    let content = required(&req.content, "content")?;

    let post = PostService::new(state.db.clone())
        .create(&user, title, content)
        .await?;

    Ok((StatusCode::CREATED, Json(post_to_response(post))))
}

/// GET /api/posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let post = PostService::new(state.db.clone()).get(&id).await?;

    Ok(Json(post_to_response(post)))
}

/// PUT /api/posts/:id
pub async fn replace_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<PostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let title = required(&req.title, "title")?;
    let content = required(&req.content, "content")?;

    let post = PostService::new(state.db.clone())
        .update(&user, &id, Some(title), Some(content))
        .await?;

    Ok(Json(post_to_response(post)))
}

/// PATCH /api/posts/:id
pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<PostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let post = PostService::new(state.db.clone())
        .update(&user, &id, req.title.as_deref(), req.content.as_deref())
        .await?;

    Ok(Json(post_to_response(post)))
}

/// DELETE /api/posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    PostService::new(state.db.clone()).delete(&user, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/posts/:id/like
pub async fn like_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    PostService::new(state.db.clone()).like(&user, &id).await?;

    Ok(Json(MessageResponse::new("Post liked")))
}

/// POST /api/posts/:id/unlike
pub async fn unlike_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    PostService::new(state.db.clone()).unlike(&user, &id).await?;

    Ok(Json(MessageResponse::new("Post unliked")))
}
