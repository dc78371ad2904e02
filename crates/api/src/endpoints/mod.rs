//! API endpoints.

#![allow(missing_docs)]

mod auth;
mod posts;
mod users;

use axum::Router;
use circles_core::{PostService, UserService};

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub post_service: PostService,
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/user", users::router())
        .nest("/api/posts", posts::router())
}
