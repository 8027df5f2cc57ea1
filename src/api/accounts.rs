//! Account endpoints
//!
//! Registration, token login/logout, user CRUD and the follow graph.

use axum::{
    extract::{OriginalUri, Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{Map, Value, json};

use super::converters::{required, user_to_response};
use super::dto::*;
use super::extract::ApiJson;
use super::pagination::{Page, PageParams};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::metrics::LOGINS_TOTAL;
use crate::service::AccountService;

fn account_service(state: &AppState) -> AccountService {
    AccountService::new(state.db.clone(), state.config.auth.min_password_length)
}

/// POST /api/accounts/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let username = required(&req.username, "username")?;
    let password = required(&req.password, "password")?;

    let service = account_service(&state);
    let user = service.register(username, password).await?;
    let profile = service.profile(user).await?;

    Ok((StatusCode::CREATED, Json(user_to_response(profile))))
}

// =============================================================================
// Login / logout
// =============================================================================

fn login_rejected(errors: Map<String, Value>) -> Response {
    LOGINS_TOTAL.with_label_values(&["rejected"]).inc();
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "message": "Wrong credentials.",
            "success": false,
            "errors": errors,
            "errorcode": StatusCode::BAD_REQUEST.as_u16(),
        })),
    )
        .into_response()
}

fn login_failed(status: StatusCode, details: String) -> Response {
    LOGINS_TOTAL.with_label_values(&["error"]).inc();
    (
        status,
        Json(json!({
            "message": "An unexpected error occurred.",
            "success": false,
            "details": details,
            "errorcode": status.as_u16(),
        })),
    )
        .into_response()
}

/// Collect per-field errors for absent or blank credentials
fn missing_credentials(req: &LoginRequest) -> Map<String, Value> {
    let mut errors = Map::new();
    for (field, value) in [("username", &req.username), ("password", &req.password)] {
        match value.as_deref() {
            None => {
                errors.insert(field.to_string(), json!(["This field is required."]));
            }
            Some(value) if value.trim().is_empty() => {
                errors.insert(field.to_string(), json!(["This field may not be blank."]));
            }
            Some(_) => {}
        }
    }
    errors
}

/// POST /api/accounts/login
///
/// Returns the caller's token, creating it on first login. Errors use the
/// login envelope instead of the generic `{"error": ...}` body.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return login_failed(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let errors = missing_credentials(&req);
    if !errors.is_empty() {
        return login_rejected(errors);
    }
    let (username, password) = (
        req.username.unwrap_or_default(),
        req.password.unwrap_or_default(),
    );

    match account_service(&state).login(&username, &password).await {
        Ok(Some(token)) => {
            LOGINS_TOTAL.with_label_values(&["success"]).inc();
            (
                StatusCode::CREATED,
                Json(json!({
                    "token": token.key,
                    "user_id": token.user_id,
                    "message": "Login successful",
                    "success": true,
                })),
            )
                .into_response()
        }
        Ok(None) => {
            let mut errors = Map::new();
            errors.insert(
                "non_field_errors".to_string(),
                json!(["Unable to log in with provided credentials."]),
            );
            login_rejected(errors)
        }
        Err(error) => {
            tracing::error!(%error, "Login failed unexpectedly");
            login_failed(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}

/// POST /api/accounts/logout
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, AppError> {
    account_service(&state).logout(&user).await?;

    Ok(Json(MessageResponse::new("Successfully logged out.")))
}

// =============================================================================
// Users
// =============================================================================

/// GET /api/accounts/users
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(page): Query<PageParams>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<UserResponse>>, AppError> {
    let window = page.window(&state.config.pagination)?;
    let listing = account_service(&state)
        .list(params.search.as_deref(), window.limit(), window.offset())
        .await?;

    Ok(Json(Page::build(
        listing.map(user_to_response),
        window,
        &state.config.server.base_url(),
        &uri,
    )?))
}

/// GET /api/accounts/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let service = account_service(&state);
    let user = service.get(&id).await?;

    Ok(Json(user_to_response(service.profile(user).await?)))
}

async fn apply_user_update(
    state: &AppState,
    caller: &crate::data::User,
    id: &str,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<Json<UserResponse>, AppError> {
    let service = account_service(state);
    let user = service.update(caller, id, username, password).await?;

    Ok(Json(user_to_response(service.profile(user).await?)))
}

/// PUT /api/accounts/users/:id
pub async fn replace_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let username = required(&req.username, "username")?;
    let password = required(&req.password, "password")?;

    apply_user_update(&state, &caller, &id, Some(username), Some(password)).await
}

/// PATCH /api/accounts/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    apply_user_update(
        &state,
        &caller,
        &id,
        req.username.as_deref(),
        req.password.as_deref(),
    )
    .await
}

/// DELETE /api/accounts/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    account_service(&state).delete(&caller, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Follow graph
// =============================================================================

/// POST /api/accounts/users/:id/follow
pub async fn follow_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let target = account_service(&state).follow(&caller, &id).await?;

    Ok(Json(MessageResponse::new(format!(
        "You are now following {}",
        target.username
    ))))
}

/// POST /api/accounts/users/:id/unfollow
pub async fn unfollow_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let target = account_service(&state).unfollow(&caller, &id).await?;

    Ok(Json(MessageResponse::new(format!(
        "You have unfollowed {}",
        target.username
    ))))
}
