//! Post endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post, put},
};
use circles_common::AppResult;
use circles_core::{CreatePostInput, DeletePostInput, ReactionInput, UpdatePostInput};
use circles_db::entities::post;
use serde::Serialize;

use crate::endpoints::AppState;
use crate::response::ApiResponse;

/// Whole post document nested under the `userId` key, the shape the
/// update and reaction responses carry.
#[derive(Debug, Serialize)]
struct PostDocPayload {
    #[serde(rename = "userId")]
    user_id: post::Model,
}

#[derive(Debug, Serialize)]
struct PostIdPayload {
    #[serde(rename = "userId")]
    user_id: String,
}

/// Create a post.
async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<ApiResponse<post::Model>> {
    let post = state.post_service.create(input).await?;

    Ok(ApiResponse::created("Post created successfully", post))
}

/// Update a post's content.
async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePostInput>,
) -> AppResult<ApiResponse<PostDocPayload>> {
    let post = state.post_service.update(&id, input).await?;

    Ok(ApiResponse::ok(
        "Post updated successfully",
        PostDocPayload { user_id: post },
    ))
}

/// Toggle a like on a post.
async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ReactionInput>,
) -> AppResult<ApiResponse<PostDocPayload>> {
    let post = state.post_service.like(&id, input).await?;

    Ok(ApiResponse::ok(
        "Post like added successfully",
        PostDocPayload { user_id: post },
    ))
}

/// Toggle a dislike on a post.
async fn dislike_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ReactionInput>,
) -> AppResult<ApiResponse<PostDocPayload>> {
    let post = state.post_service.dislike(&id, input).await?;

    Ok(ApiResponse::ok(
        "Post dislike added successfully",
        PostDocPayload { user_id: post },
    ))
}

/// Delete a post.
async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<DeletePostInput>,
) -> AppResult<ApiResponse<PostIdPayload>> {
    let post_id = state.post_service.delete(&id, input).await?;

    Ok(ApiResponse::ok(
        "Post deleted successfully",
        PostIdPayload { user_id: post_id },
    ))
}

/// Merged timeline for the addressed user.
async fn timeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<post::Model>>> {
    let posts = state.post_service.timeline(&id).await?;

    Ok(ApiResponse::ok("Post successfully", posts))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post))
        .route("/{id}", get(timeline))
        .route("/{id}", put(update_post))
        .route("/{id}", delete(delete_post))
        .route("/{id}/likes", patch(like_post))
        .route("/{id}/dislike", patch(dislike_post))
}
