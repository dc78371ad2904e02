//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    #[serde(rename = "userId")]
    pub user_id: String,

    #[sea_orm(column_name = "desc", column_type = "Text")]
    #[serde(rename = "desc")]
    pub description: String,

    /// Attached image references
    #[sea_orm(column_type = "JsonBinary")]
    pub img: Json,

    /// IDs of users who liked this post
    #[sea_orm(column_type = "JsonBinary")]
    pub likes: Json,

    /// IDs of users who disliked this post (singular, as stored)
    #[sea_orm(column_type = "JsonBinary")]
    pub dislike: Json,

    #[serde(rename = "createdAt")]
    pub created_at: DateTimeWithTimeZone,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Liker IDs decoded from the `jsonb` column.
    #[must_use]
    pub fn like_ids(&self) -> Vec<String> {
        serde_json::from_value(self.likes.clone()).unwrap_or_default()
    }

    /// Disliker IDs decoded from the `jsonb` column.
    #[must_use]
    pub fn dislike_ids(&self) -> Vec<String> {
        serde_json::from_value(self.dislike.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reaction_ids_roundtrip() {
        let post = Model {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            description: "hello".to_string(),
            img: json!([]),
            likes: json!(["u2"]),
            dislike: json!(["u3", "u4"]),
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        };

        assert_eq!(post.like_ids(), vec!["u2"]);
        assert_eq!(post.dislike_ids(), vec!["u3", "u4"]);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_wire_names() {
        let post = Model {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            description: "hello".to_string(),
            img: json!(["ref1"]),
            likes: json!([]),
            dislike: json!([]),
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        };

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["desc"], "hello");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }
}
