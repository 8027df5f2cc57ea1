//! API layer
//!
//! HTTP handlers for:
//! - Accounts (registration, token login, follow graph)
//! - Posts, likes and the feed
//! - Comments
//! - Metrics (Prometheus)

mod accounts;
mod comments;
mod converters;
mod dto;
mod extract;
mod feed;
pub mod metrics;
mod pagination;
mod posts;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use converters::*;
pub use dto::*;
pub use extract::ApiJson;
pub use pagination::{Page, PageParams, PageWindow};

/// Create the `/api` router
///
/// Authentication is enforced per handler through the `CurrentUser`
/// extractor; read-only post and comment routes are public.
pub fn api_router() -> Router<AppState> {
    let account_routes = Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/users", get(accounts::list_users))
        .route(
            "/users/:id",
            get(accounts::get_user)
                .put(accounts::replace_user)
                .patch(accounts::update_user)
                .delete(accounts::delete_user),
        )
        .route("/users/:id/follow", post(accounts::follow_user))
        .route("/users/:id/unfollow", post(accounts::unfollow_user));

    let post_routes = Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::replace_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/like", post(posts::like_post))
        .route("/posts/:id/unlike", post(posts::unlike_post))
        .route("/feed", get(feed::feed));

    let comment_routes = Router::new()
        .route(
            "/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/comments/:id",
            get(comments::get_comment)
                .put(comments::update_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        );

    Router::new()
        .nest("/accounts", account_routes)
        .merge(post_routes)
        .merge(comment_routes)
}
