//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use circles_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, TransactionTrait, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use serde_json::json;

/// Rejection raised for identifiers that cannot be ULIDs, before the
/// store is consulted.
fn malformed_id() -> AppError {
    AppError::Unprocessable("_id length is incorrect".to_string())
}

/// Fetch one user row `FOR UPDATE` inside `txn`.
async fn lock_user_row(
    txn: &DatabaseTransaction,
    id: &str,
    missing: &'static str,
) -> AppResult<user::Model> {
    User::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::Database(missing.to_string()))
}

/// Fetch both rows of a follow edge `FOR UPDATE`. Locks are taken in id
/// order so concurrent edge writes over the same pair cannot deadlock.
async fn lock_edge_rows(
    txn: &DatabaseTransaction,
    follower_id: &str,
    followee_id: &str,
    missing: &'static str,
) -> AppResult<(user::Model, user::Model)> {
    if follower_id <= followee_id {
        let follower = lock_user_row(txn, follower_id, missing).await?;
        let followee = lock_user_row(txn, followee_id, missing).await?;
        Ok((follower, followee))
    } else {
        let followee = lock_user_row(txn, followee_id, missing).await?;
        let follower = lock_user_row(txn, follower_id, missing).await?;
        Ok((follower, followee))
    }
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    ///
    /// A malformed identifier fails `Unprocessable` without touching the
    /// store.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        if !circles_common::id::is_well_formed(id) {
            return Err(malformed_id());
        }

        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user matching either the username or the email.
    pub async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Hard-delete a user by ID, returning the number of rows removed.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<u64> {
        if !circles_common::id::is_well_formed(id) {
            return Err(malformed_id());
        }

        User::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map(|res| res.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record `follower_id` following `followee_id` on both sides of the
    /// graph.
    ///
    /// Both documents are re-read under row locks and rewritten inside
    /// one transaction so the symmetry invariant survives concurrent
    /// requests. Appends are idempotent; an edge that is already present
    /// is left alone.
    pub async fn add_follow_edge(
        &self,
        follower_id: &str,
        followee_id: &str,
        now: DateTimeWithTimeZone,
    ) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let (follower, followee) = lock_edge_rows(
            &txn,
            follower_id,
            followee_id,
            "user row missing during follow update",
        )
        .await?;

        let mut followers = followee.follower_ids();
        if !followers.iter().any(|id| id == follower_id) {
            followers.push(follower_id.to_string());
        }
        let mut followings = follower.following_ids();
        if !followings.iter().any(|id| id == followee_id) {
            followings.push(followee_id.to_string());
        }

        User::update_many()
            .col_expr(user::Column::Followers, Expr::value(json!(followers)))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(followee_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        User::update_many()
            .col_expr(user::Column::Followings, Expr::value(json!(followings)))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(follower_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove the follow edge between `follower_id` and `followee_id`
    /// from both sides of the graph, inside one transaction and under
    /// the same row locks as [`Self::add_follow_edge`].
    pub async fn remove_follow_edge(
        &self,
        follower_id: &str,
        followee_id: &str,
        now: DateTimeWithTimeZone,
    ) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let (follower, followee) = lock_edge_rows(
            &txn,
            follower_id,
            followee_id,
            "user row missing during unfollow update",
        )
        .await?;

        let mut followers = followee.follower_ids();
        followers.retain(|id| id != follower_id);
        let mut followings = follower.following_ids();
        followings.retain(|id| id != followee_id);

        User::update_many()
            .col_expr(user::Column::Followers, Expr::value(json!(followers)))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(followee_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        User::update_many()
            .col_expr(user::Column::Followings, Expr::value(json!(followings)))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(follower_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
