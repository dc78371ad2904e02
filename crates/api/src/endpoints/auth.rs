//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use circles_common::AppResult;
use circles_core::{CreateUserInput, LoginInput};
use serde::Serialize;

use crate::endpoints::AppState;
use crate::response::ApiResponse;

#[derive(Debug, Serialize)]
struct UserIdPayload {
    #[serde(rename = "userId")]
    user_id: String,
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> AppResult<ApiResponse<UserIdPayload>> {
    let user_id = state.user_service.create(input).await?;
    tracing::info!(%user_id, "user registered");

    Ok(ApiResponse::created(
        "User created successfully",
        UserIdPayload { user_id },
    ))
}

/// Log in with email and password.
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<ApiResponse<UserIdPayload>> {
    let user_id = state.user_service.login(input).await?;

    Ok(ApiResponse::ok(
        "User logged in successfully",
        UserIdPayload { user_id },
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
