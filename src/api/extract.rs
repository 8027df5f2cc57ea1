//! Request body extractor

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejection is an [`AppError`]
///
/// Body errors come back as 400 `{"error": ...}` instead of axum's plain-text
/// 415/422 responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Titled {
        #[allow(dead_code)]
        title: String,
    }

    fn json_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/posts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn mistyped_field_is_a_validation_error() {
        let result = ApiJson::<Titled>::from_request(json_request(r#"{"title":5}"#), &()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn missing_content_type_is_a_validation_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/posts")
            .body(Body::from(r#"{"title":"x"}"#))
            .unwrap();
        let result = ApiJson::<Titled>::from_request(request, &()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn well_formed_body_is_extracted() {
        let result = ApiJson::<Titled>::from_request(json_request(r#"{"title":"x"}"#), &()).await;
        assert!(matches!(result, Ok(ApiJson(Titled { .. }))));
    }
}
