//! Authentication extractors
//!
//! Resolves the `Authorization` header to a [`User`] via the token table.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use crate::AppState;
use crate::data::User;
use crate::error::AppError;

/// Pull the token key out of `Authorization: Bearer <key>` or
/// `Authorization: Token <key>`.
fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToOwned::to_owned)
}

async fn authenticate_token(token: &str, state: &AppState) -> Result<User, AppError> {
    state
        .db
        .get_user_by_token(token)
        .await?
        .ok_or(AppError::Unauthorized)
}

/// Extractor for the authenticated caller
///
/// Rejects with 401 when the header is missing or the token is unknown.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(CurrentUser(user));
        }

        let state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user = authenticate_token(&token, &state).await?;
        parts.extensions.insert(user.clone());

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_and_token_prefixes_are_accepted() {
        assert_eq!(
            extract_token_from_headers(&headers_with("Bearer abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_token_from_headers(&headers_with("Token abc123")),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert_eq!(extract_token_from_headers(&headers_with("Basic abc123")), None);
        assert_eq!(extract_token_from_headers(&headers_with("Bearer ")), None);
        assert_eq!(extract_token_from_headers(&HeaderMap::new()), None);
    }
}
