//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Relationship status advertised on a profile.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
    #[default]
    #[sea_orm(string_value = "single")]
    Single,
    #[sea_orm(string_value = "married")]
    Married,
    #[sea_orm(string_value = "separated")]
    Separated,
}

/// Wire names are pinned to the public API: `isAdmin`, `createdAt` and
/// `updatedAt` are camelCase while `profile_picture` and
/// `cover_picture` stay snake_case.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Stored lowercase
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 PHC string, never the plaintext
    #[serde(skip_serializing, default)]
    pub password: String,

    pub profile_picture: String,

    pub cover_picture: String,

    /// IDs of users following this user
    #[sea_orm(column_type = "JsonBinary")]
    pub followers: Json,

    /// IDs of users this user follows
    #[sea_orm(column_type = "JsonBinary")]
    pub followings: Json,

    #[serde(rename = "isAdmin")]
    pub is_admin: bool,

    #[sea_orm(column_name = "desc", column_type = "Text")]
    #[serde(rename = "desc")]
    pub description: String,

    pub city: String,

    #[sea_orm(column_name = "from")]
    #[serde(rename = "from")]
    pub hometown: String,

    pub relationship: RelationshipStatus,

    #[serde(rename = "createdAt")]
    pub created_at: DateTimeWithTimeZone,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Follower IDs decoded from the `jsonb` column.
    ///
    /// Unparseable content yields an empty list rather than an error.
    #[must_use]
    pub fn follower_ids(&self) -> Vec<String> {
        serde_json::from_value(self.followers.clone()).unwrap_or_default()
    }

    /// Following IDs decoded from the `jsonb` column.
    #[must_use]
    pub fn following_ids(&self) -> Vec<String> {
        serde_json::from_value(self.followings.clone()).unwrap_or_default()
    }
}
