//! User service.
//!
//! Account lifecycle, credential checks, and the follow graph. Every
//! operation answers with the exact message and status contract the
//! HTTP layer exposes, so failures bubbling out of the repositories
//! are folded into each operation's fixed fallback here.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use circles_common::{AppError, AppResult, IdGenerator};
use circles_db::entities::user::{self, RelationshipStatus};
use circles_db::repositories::UserRepository;
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::{internal_fallback, unprocessable_fallback};

/// Input for registering a new account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    #[serde(default)]
    #[validate(length(min = 3, max = 20))]
    pub username: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8))]
    pub password: String,
}

/// Input for logging in with email and password.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8))]
    pub password: String,
}

/// Input for partially updating a user document.
///
/// The typed fields are the allow-list; anything else in the payload is
/// dropped during deserialization. Fields left absent are not written.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserInput {
    /// Identifier of the acting user. The update is applied to this
    /// account, whatever target the caller addressed.
    #[serde(default, rename = "userId")]
    #[validate(length(min = 1))]
    pub user_id: String,
    #[serde(default, rename = "isAdmin")]
    pub is_admin: bool,
    #[validate(length(min = 3, max = 20))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_picture: Option<String>,
    pub cover_picture: Option<String>,
    pub followers: Option<Vec<String>>,
    pub followings: Option<Vec<String>>,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "from")]
    pub hometown: Option<String>,
    pub relationship: Option<RelationshipStatus>,
}

/// Input for deleting a user account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeleteUserInput {
    /// Identifier of the acting user. The delete removes this account.
    #[serde(default, rename = "userId")]
    #[validate(length(min = 1))]
    pub user_id: String,
    #[serde(default, rename = "isAdmin")]
    pub is_admin: bool,
}

/// Input naming the other side of a follow or unfollow.
#[derive(Debug, Clone, Deserialize)]
pub struct FollowInput {
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

/// User document view returned to callers: the stored fields minus the
/// password hash and timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub profile_picture: String,
    pub cover_picture: String,
    pub followers: Vec<String>,
    pub followings: Vec<String>,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    #[serde(rename = "desc")]
    pub description: String,
    pub city: String,
    #[serde(rename = "from")]
    pub hometown: String,
    pub relationship: RelationshipStatus,
}

impl From<user::Model> for UserProfile {
    fn from(user: user::Model) -> Self {
        let followers = user.follower_ids();
        let followings = user.following_ids();
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            profile_picture: user.profile_picture,
            cover_picture: user.cover_picture,
            followers,
            followings,
            is_admin: user.is_admin,
            description: user.description,
            city: user.city,
            hometown: user.hometown,
            relationship: user.relationship,
        }
    }
}

/// User service.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account and return its identifier.
    ///
    /// Fails with `Conflict` when the username or email is already
    /// taken. The email is stored lowercased.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<String> {
        input.validate()?;
        let email = input.email.to_lowercase();

        let result: AppResult<String> = async {
            if self
                .user_repo
                .find_by_username_or_email(&input.username, &email)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(
                    "Username or email already exists".to_string(),
                ));
            }

            let password = hash_password(&input.password)?;
            let now: DateTimeWithTimeZone = Utc::now().into();
            let user = self
                .user_repo
                .create(user::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    username: Set(input.username),
                    email: Set(email),
                    password: Set(password),
                    profile_picture: Set(String::new()),
                    cover_picture: Set(String::new()),
                    followers: Set(json!([])),
                    followings: Set(json!([])),
                    is_admin: Set(false),
                    description: Set(String::new()),
                    city: Set(String::new()),
                    hometown: Set(String::new()),
                    relationship: Set(RelationshipStatus::Single),
                    created_at: Set(now),
                    updated_at: Set(now),
                })
                .await?;
            Ok(user.id)
        }
        .await;
        result.map_err(internal_fallback)
    }

    /// Check credentials and return the account identifier.
    pub async fn login(&self, input: LoginInput) -> AppResult<String> {
        input.validate()?;
        let email = input.email.to_lowercase();

        let result: AppResult<String> = async {
            let user = self
                .user_repo
                .find_by_email(&email)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Email is incorrect.".to_string()))?;
            if !verify_password(&input.password, &user.password)? {
                return Err(AppError::Unauthorized("Password is incorrect.".to_string()));
            }
            Ok(user.id)
        }
        .await;
        result.map_err(internal_fallback)
    }

    /// Apply a partial update on behalf of the acting user.
    ///
    /// Allowed when the acting user addresses itself or carries the
    /// admin flag. The write is keyed by the acting user's identifier,
    /// so an admin addressing another account still rewrites its own
    /// document. A supplied password is rehashed before persisting.
    pub async fn partial_update(&self, target_id: &str, input: UpdateUserInput) -> AppResult<String> {
        input.validate()?;
        if !(input.user_id == target_id || input.is_admin) {
            return Err(AppError::Forbidden(
                "You are not authorized to update this resource.".to_string(),
            ));
        }

        let result: AppResult<String> = async {
            let user = self
                .user_repo
                .find_by_id(&input.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

            let mut active: user::ActiveModel = user.into();
            if let Some(username) = input.username {
                active.username = Set(username);
            }
            if let Some(email) = input.email {
                active.email = Set(email.to_lowercase());
            }
            if let Some(password) = input.password {
                active.password = Set(hash_password(&password)?);
            }
            if let Some(profile_picture) = input.profile_picture {
                active.profile_picture = Set(profile_picture);
            }
            if let Some(cover_picture) = input.cover_picture {
                active.cover_picture = Set(cover_picture);
            }
            if let Some(followers) = input.followers {
                active.followers = Set(json!(followers));
            }
            if let Some(followings) = input.followings {
                active.followings = Set(json!(followings));
            }
            if let Some(description) = input.description {
                active.description = Set(description);
            }
            if let Some(city) = input.city {
                active.city = Set(city);
            }
            if let Some(hometown) = input.hometown {
                active.hometown = Set(hometown);
            }
            if let Some(relationship) = input.relationship {
                active.relationship = Set(relationship);
            }
            active.updated_at = Set(Utc::now().into());

            let updated = self.user_repo.update(active).await?;
            Ok(updated.id)
        }
        .await;
        result.map_err(unprocessable_fallback)
    }

    /// Delete the acting user's account and return its identifier.
    ///
    /// Same authorization rule as `partial_update`, and the same
    /// keying: the account that is removed is the acting user's, not
    /// the addressed one.
    pub async fn delete(&self, target_id: &str, input: DeleteUserInput) -> AppResult<String> {
        input.validate()?;
        if !(input.user_id == target_id || input.is_admin) {
            return Err(AppError::Forbidden(
                "You are not authorized to delete this resource.".to_string(),
            ));
        }

        let result: AppResult<String> = async {
            self.user_repo
                .find_by_id(&input.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
            self.user_repo.delete_by_id(&input.user_id).await?;
            Ok(input.user_id.clone())
        }
        .await;
        result.map_err(unprocessable_fallback)
    }

    /// Fetch a user document without its password and timestamps.
    pub async fn find_user(&self, id: &str) -> AppResult<UserProfile> {
        let result: AppResult<UserProfile> = async {
            let user = self
                .user_repo
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
            Ok(UserProfile::from(user))
        }
        .await;
        result.map_err(unprocessable_fallback)
    }

    /// Follow the user named in the input and return their username.
    ///
    /// Both sides of the edge are written together so the follower and
    /// followings arrays stay mirror images of each other.
    pub async fn follow(&self, current_user_id: &str, input: FollowInput) -> AppResult<String> {
        let result: AppResult<String> = async {
            let Some(target_id) = input.user_id.as_deref().filter(|id| !id.is_empty()) else {
                return Err(AppError::BadRequest("missing or invalid data".to_string()));
            };
            if current_user_id == target_id {
                return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
            }

            self.user_repo
                .find_by_id(current_user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("User doesn't exists".to_string()))?;
            let target = self
                .user_repo
                .find_by_id(target_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound("User you want to follow doesn't exists".to_string())
                })?;

            if target
                .follower_ids()
                .iter()
                .any(|id| id == current_user_id)
            {
                return Err(AppError::Conflict(
                    "User is already following this other user".to_string(),
                ));
            }

            self.user_repo
                .add_follow_edge(current_user_id, target_id, Utc::now().into())
                .await?;
            Ok(target.username)
        }
        .await;
        result.map_err(unprocessable_fallback)
    }

    /// Undo a follow edge and return the target's username.
    ///
    /// Fails with `NotFound` when the acting user's followings do not
    /// contain the target; the check reads the acting side of the
    /// graph, not the target's followers.
    pub async fn unfollow(&self, current_user_id: &str, input: FollowInput) -> AppResult<String> {
        let result: AppResult<String> = async {
            let Some(target_id) = input.user_id.as_deref().filter(|id| !id.is_empty()) else {
                return Err(AppError::BadRequest("missing or invalid data".to_string()));
            };
            if current_user_id == target_id {
                return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
            }

            let current = self
                .user_repo
                .find_by_id(current_user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("User doesn't exists".to_string()))?;
            let target = self
                .user_repo
                .find_by_id(target_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound("User you want to unfollow doesn't exists".to_string())
                })?;

            if !current.following_ids().iter().any(|id| id == target_id) {
                return Err(AppError::NotFound(
                    "User is not part of users you follow".to_string(),
                ));
            }

            self.user_repo
                .remove_follow_edge(current_user_id, target_id, Utc::now().into())
                .await?;
            Ok(target.username)
        }
        .await;
        result.map_err(unprocessable_fallback)
    }
}

/// Hash a password using Argon2id with a per-user random salt.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;
    Ok(password_hash.to_string())
}

/// Verify a password against a stored PHC-format hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
