//! User endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch},
};
use circles_common::AppResult;
use circles_core::{DeleteUserInput, FollowInput, UpdateUserInput, UserProfile};
use serde::Serialize;

use crate::endpoints::AppState;
use crate::response::ApiResponse;

#[derive(Debug, Serialize)]
struct UserIdPayload {
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Debug, Serialize)]
struct UserPayload {
    user: UserProfile,
}

#[derive(Debug, Serialize)]
struct UsernamePayload {
    username: String,
}

/// Partially update a user document.
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<ApiResponse<UserIdPayload>> {
    let user_id = state.user_service.partial_update(&id, input).await?;

    Ok(ApiResponse::ok(
        "User updated successfully",
        UserIdPayload { user_id },
    ))
}

/// Delete a user account.
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<DeleteUserInput>,
) -> AppResult<ApiResponse<UserIdPayload>> {
    let user_id = state.user_service.delete(&id, input).await?;

    Ok(ApiResponse::ok(
        "User deleted successfully",
        UserIdPayload { user_id },
    ))
}

/// Fetch a user document without its password and timestamps.
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserPayload>> {
    let user = state.user_service.find_user(&id).await?;

    Ok(ApiResponse::ok(
        "successfully retrive user",
        UserPayload { user },
    ))
}

/// Follow the user named in the body on behalf of the addressed user.
async fn follow_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<FollowInput>,
) -> AppResult<ApiResponse<UsernamePayload>> {
    let username = state.user_service.follow(&id, input).await?;

    Ok(ApiResponse::ok(
        "successfully follow other user",
        UsernamePayload { username },
    ))
}

/// Unfollow the user named in the body on behalf of the addressed user.
async fn unfollow_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<FollowInput>,
) -> AppResult<ApiResponse<UsernamePayload>> {
    let username = state.user_service.unfollow(&id, input).await?;

    Ok(ApiResponse::ok(
        "successfully unfollow user",
        UsernamePayload { username },
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", patch(update_user))
        .route("/{id}", delete(delete_user))
        .route("/{id}", get(get_user))
        .route("/{id}/follow", patch(follow_user))
        .route("/{id}/unfollow", patch(unfollow_user))
}
