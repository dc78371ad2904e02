//! Post service.
//!
//! Post lifecycle, the like/dislike toggle pair, and the merged
//! timeline. Reaction arrays are computed in memory and written in a
//! single statement so a user is never stored in both arrays at once.

use chrono::Utc;
use circles_common::{AppError, AppResult, IdGenerator};
use circles_db::entities::post;
use circles_db::repositories::{PostRepository, UserRepository};
use futures::future::join_all;
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::{internal_fallback, unprocessable_fallback};

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostInput {
    #[serde(default, rename = "userId")]
    #[validate(length(min = 1))]
    pub user_id: String,
    #[serde(default, rename = "desc")]
    #[validate(length(max = 500))]
    pub description: String,
    #[serde(default)]
    pub img: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub dislike: Vec<String>,
}

/// Input for updating a post.
///
/// `user_id` must repeat the post's own identifier to pass the
/// ownership gate; fields left absent are not written.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePostInput {
    #[serde(default, rename = "userId")]
    pub user_id: String,
    #[serde(rename = "desc")]
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub img: Option<Vec<String>>,
    pub likes: Option<Vec<String>>,
    pub dislike: Option<Vec<String>>,
}

/// Input for deleting a post.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletePostInput {
    #[serde(default, rename = "userId")]
    pub user_id: String,
}

/// Input naming the reacting user for a like or dislike.
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionInput {
    #[serde(default, rename = "userId")]
    pub user_id: String,
}

/// Post service.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(post_repo: PostRepository, user_repo: UserRepository) -> Self {
        Self {
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Persist a new post and return the stored document.
    ///
    /// The author identifier is stored as given; no existence check is
    /// made against the user collection.
    pub async fn create(&self, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        let result: AppResult<post::Model> = async {
            let now: DateTimeWithTimeZone = Utc::now().into();
            let post = self
                .post_repo
                .create(post::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(input.user_id),
                    description: Set(input.description),
                    img: Set(json!(input.img)),
                    likes: Set(json!(input.likes)),
                    dislike: Set(json!(input.dislike)),
                    created_at: Set(now),
                    updated_at: Set(now),
                })
                .await?;
            Ok(post)
        }
        .await;
        result.map_err(internal_fallback)
    }

    /// Update a post's content and return the stored document.
    ///
    /// The ownership gate compares `user_id` against the post's own
    /// identifier, and the accepted value is then written back to the
    /// author column.
    pub async fn update(&self, post_id: &str, input: UpdatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        let result: AppResult<post::Model> = async {
            let post = self
                .post_repo
                .find_by_id(post_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
            if post.id != input.user_id {
                return Err(AppError::BadRequest("Incorrect ID".to_string()));
            }

            let mut active: post::ActiveModel = post.into();
            active.user_id = Set(input.user_id);
            if let Some(description) = input.description {
                active.description = Set(description);
            }
            if let Some(img) = input.img {
                active.img = Set(json!(img));
            }
            if let Some(likes) = input.likes {
                active.likes = Set(json!(likes));
            }
            if let Some(dislike) = input.dislike {
                active.dislike = Set(json!(dislike));
            }
            active.updated_at = Set(Utc::now().into());

            let updated = self.post_repo.update(active).await?;
            Ok(updated)
        }
        .await;
        result.map_err(unprocessable_fallback)
    }

    /// Hard-delete a post and return its identifier.
    ///
    /// Same ownership gate as `update`.
    pub async fn delete(&self, post_id: &str, input: DeletePostInput) -> AppResult<String> {
        let result: AppResult<String> = async {
            let post = self
                .post_repo
                .find_by_id(post_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
            if post.id != input.user_id {
                return Err(AppError::BadRequest("Incorrect ID".to_string()));
            }

            self.post_repo.delete_by_id(post_id).await?;
            Ok(post.id)
        }
        .await;
        result.map_err(unprocessable_fallback)
    }

    /// Toggle a like by the reacting user and return the updated post.
    pub async fn like(&self, post_id: &str, input: ReactionInput) -> AppResult<post::Model> {
        let result: AppResult<post::Model> = async {
            let post = self
                .post_repo
                .find_by_id(post_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

            let (likes, dislike) =
                toggle_like(&input.user_id, &post.like_ids(), &post.dislike_ids());
            let now: DateTimeWithTimeZone = Utc::now().into();
            self.post_repo
                .update_reactions(&post.id, &likes, &dislike, now)
                .await?;

            Ok(post::Model {
                likes: json!(likes),
                dislike: json!(dislike),
                updated_at: now,
                ..post
            })
        }
        .await;
        result.map_err(unprocessable_fallback)
    }

    /// Toggle a dislike by the reacting user and return the updated post.
    pub async fn dislike(&self, post_id: &str, input: ReactionInput) -> AppResult<post::Model> {
        let result: AppResult<post::Model> = async {
            let post = self
                .post_repo
                .find_by_id(post_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

            let (likes, dislike) =
                toggle_dislike(&input.user_id, &post.like_ids(), &post.dislike_ids());
            let now: DateTimeWithTimeZone = Utc::now().into();
            self.post_repo
                .update_reactions(&post.id, &likes, &dislike, now)
                .await?;

            Ok(post::Model {
                likes: json!(likes),
                dislike: json!(dislike),
                updated_at: now,
                ..post
            })
        }
        .await;
        result.map_err(unprocessable_fallback)
    }

    /// Collect the user's own posts and those of everyone they follow,
    /// sorted ascending by last update.
    ///
    /// A failed lookup for a single followed user contributes nothing
    /// instead of failing the whole feed.
    pub async fn timeline(&self, user_id: &str) -> AppResult<Vec<post::Model>> {
        let result: AppResult<Vec<post::Model>> = async {
            let current = self
                .user_repo
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

            let mut timeline = self.post_repo.find_by_user_id(&current.id).await?;

            let followings = current.following_ids();
            let friend_batches = join_all(
                followings
                    .iter()
                    .map(|friend_id| self.post_repo.find_by_user_id(friend_id)),
            )
            .await;
            for batch in friend_batches {
                timeline.extend(batch.unwrap_or_default());
            }

            timeline.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
            Ok(timeline)
        }
        .await;
        result.map_err(unprocessable_fallback)
    }
}

/// Arrays after a like toggle: a present like is removed; otherwise any
/// dislike by the same user is cleared and the like appended.
fn toggle_like(user_id: &str, likes: &[String], dislike: &[String]) -> (Vec<String>, Vec<String>) {
    let mut likes = likes.to_vec();
    let mut dislike = dislike.to_vec();
    if likes.iter().any(|id| id == user_id) {
        likes.retain(|id| id != user_id);
    } else {
        dislike.retain(|id| id != user_id);
        likes.push(user_id.to_string());
    }
    (likes, dislike)
}

/// Mirror of [`toggle_like`] with the roles of the arrays swapped.
fn toggle_dislike(
    user_id: &str,
    likes: &[String],
    dislike: &[String],
) -> (Vec<String>, Vec<String>) {
    let mut likes = likes.to_vec();
    let mut dislike = dislike.to_vec();
    if dislike.iter().any(|id| id == user_id) {
        dislike.retain(|id| id != user_id);
    } else {
        likes.retain(|id| id != user_id);
        dislike.push(user_id.to_string());
    }
    (likes, dislike)
}
