//! HTTP API layer for circles.
//!
//! REST endpoints for accounts, the follow graph, and posts:
//!
//! - **`/api/auth`**: registration and login
//! - **`/api/user`**: profile reads, partial updates, deletes, follow/unfollow
//! - **`/api/posts`**: post lifecycle, like/dislike toggles, the timeline
//!
//! Built on Axum 0.8. Success responses carry a `{ message, data }`
//! envelope; failures carry `{ error }` with the status picked by
//! [`circles_common::AppError`].

pub mod endpoints;
pub mod response;

pub use endpoints::{AppState, router};
pub use response::ApiResponse;
