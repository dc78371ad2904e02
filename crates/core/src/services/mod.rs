//! Business logic services.

#![allow(missing_docs)]

use circles_common::AppError;

pub mod post;
pub mod user;

pub use post::{CreatePostInput, DeletePostInput, PostService, ReactionInput, UpdatePostInput};
pub use user::{
    CreateUserInput, DeleteUserInput, FollowInput, LoginInput, UpdateUserInput, UserProfile,
    UserService,
};

/// Fold an unclassified failure into the fixed `Internal server error.`
/// answer used by the account-creation and login flows.
///
/// Deliberate 4xx classifications pass through untouched; anything else
/// (driver failures, hashing failures) is logged here because the
/// replacement message discards the cause.
pub(crate) fn internal_fallback(err: AppError) -> AppError {
    if err.is_classified() {
        err
    } else {
        tracing::error!(error = %err, "unclassified service failure");
        AppError::Internal("Internal server error.".to_string())
    }
}

/// Fold an unclassified failure into the fixed `_id length is incorrect`
/// answer used by the identifier-addressed flows.
pub(crate) fn unprocessable_fallback(err: AppError) -> AppError {
    if err.is_classified() {
        err
    } else {
        tracing::error!(error = %err, "unclassified service failure");
        AppError::Unprocessable("_id length is incorrect".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classified_errors_pass_through() {
        let err = internal_fallback(AppError::Conflict(
            "Username or email already exists".to_string(),
        ));
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "Username or email already exists");

        let err = unprocessable_fallback(AppError::NotFound("Post not found".to_string()));
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.to_string(), "Post not found");
    }

    #[test]
    fn test_server_failures_fold_to_internal() {
        let err = internal_fallback(AppError::Database("connection refused".to_string()));
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.to_string(), "Internal server error.");
    }

    #[test]
    fn test_server_failures_fold_to_unprocessable() {
        let err = unprocessable_fallback(AppError::Database("connection refused".to_string()));
        assert!(matches!(err, AppError::Unprocessable(_)));
        assert_eq!(err.to_string(), "_id length is incorrect");
    }
}
