//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use circles_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use serde_json::json;

fn malformed_id() -> AppError {
    AppError::Unprocessable("_id length is incorrect".to_string())
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    ///
    /// A malformed identifier fails `Unprocessable` without touching the
    /// store.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        if !circles_common::id::is_well_formed(id) {
            return Err(malformed_id());
        }

        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All posts authored by `user_id`.
    ///
    /// No identifier guard here: author IDs come out of stored follow
    /// arrays, and an unknown or garbage author simply owns no posts.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Hard-delete a post by ID, returning the number of rows removed.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<u64> {
        if !circles_common::id::is_well_formed(id) {
            return Err(malformed_id());
        }

        Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map(|res| res.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write a post's `likes` and `dislike` arrays in one UPDATE.
    ///
    /// Carrying both columns in a single statement keeps the reaction
    /// exclusivity invariant from ever being observable half-applied.
    pub async fn update_reactions(
        &self,
        post_id: &str,
        likes: &[String],
        dislike: &[String],
        now: DateTimeWithTimeZone,
    ) -> AppResult<()> {
        Post::update_many()
            .col_expr(post::Column::Likes, Expr::value(json!(likes)))
            .col_expr(post::Column::Dislike, Expr::value(json!(dislike)))
            .col_expr(post::Column::UpdatedAt, Expr::value(now))
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};
    use std::sync::Arc;

    const ULID_P: &str = "01hq3k4e5v6w7x8y9z0a1b2c3f";
    const ULID_U: &str = "01hq3k4e5v6w7x8y9z0a1b2c3g";

    fn create_test_post(id: &str, user_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            description: "hello world".to_string(),
            img: json!([]),
            likes: json!([]),
            dislike: json!([]),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let post = create_test_post(ULID_P, ULID_U);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post.clone()]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.find_by_id(ULID_P).await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().user_id, ULID_U);
    }

    #[tokio::test]
    async fn test_find_by_id_malformed_identifier() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PostRepository::new(db);
        let result = repo.find_by_id("nope").await;

        match result {
            Err(AppError::Unprocessable(msg)) => assert_eq!(msg, "_id length is incorrect"),
            other => panic!("expected Unprocessable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_by_user_id_allows_arbitrary_strings() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        // Garbage author IDs own no posts instead of failing
        let result = repo.find_by_user_id("not-a-ulid").await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_create_post() {
        let post = create_test_post(ULID_P, ULID_U);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);

        let active = post::ActiveModel {
            id: Set(ULID_P.to_string()),
            user_id: Set(ULID_U.to_string()),
            ..Default::default()
        };

        let result = repo.create(active).await.unwrap();
        assert_eq!(result.description, "hello world");
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let deleted = repo.delete_by_id(ULID_P).await.unwrap();

        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn test_update_reactions_single_statement() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo
            .update_reactions(
                ULID_P,
                &[ULID_U.to_string()],
                &[],
                Utc::now().into(),
            )
            .await;

        assert!(result.is_ok());
    }
}
