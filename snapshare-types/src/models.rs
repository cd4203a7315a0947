use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::ErrorCode;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// GraphQL `ID`s travel as strings but are integers in the store.
/// Serializes as a string, accepts either a string or a number.
pub mod graphql_id {
    use serde::{self, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Str(String),
    }

    pub fn serialize<S>(id: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawId::deserialize(deserializer)? {
            RawId::Int(id) => Ok(id),
            RawId::Str(s) => s.trim().parse::<i64>().map_err(serde::de::Error::custom),
        }
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(id: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match id {
                Some(id) => super::serialize(id, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<super::RawId>::deserialize(deserializer)? {
                None => Ok(None),
                Some(super::RawId::Int(id)) => Ok(Some(id)),
                Some(super::RawId::Str(s)) => s
                    .trim()
                    .parse::<i64>()
                    .map(Some)
                    .map_err(serde::de::Error::custom),
            }
        }
    }
}

/// Public view of an account. The password hash stays on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(with = "graphql_id")]
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(with = "graphql_id")]
    pub id: i64,
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(with = "graphql_id")]
    pub author_id: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(with = "graphql_id")]
    pub id: i64,
    pub text: String,
    #[serde(with = "graphql_id")]
    pub author_id: i64,
    #[serde(with = "graphql_id")]
    pub post_id: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

/// One user's like on one post; unique per (user_id, post_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    #[serde(with = "graphql_id")]
    pub id: i64,
    #[serde(with = "graphql_id")]
    pub user_id: i64,
    #[serde(with = "graphql_id")]
    pub post_id: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// Post as rendered in a feed, with its nested fields resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(with = "graphql_id")]
    pub id: i64,
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    pub author: User,
    pub like_count: i64,
    pub liked_by_current_user: bool,
    #[serde(default)]
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(with = "graphql_id")]
    pub id: i64,
    pub text: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<User>,
}

// Request/Response types for API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

/// Typed outcome of `deletePost`; failures are reported here instead of as
/// GraphQL errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletePostResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, with = "graphql_id::option")]
    pub id: Option<i64>,
    #[serde(default)]
    pub code: Option<ErrorCode>,
}

impl DeletePostResponse {
    pub fn deleted(id: i64) -> Self {
        Self {
            success: true,
            message: format!("Post {} deleted successfully", id),
            id: Some(id),
            code: None,
        }
    }

    pub fn failed(id: Option<i64>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            id,
            code: Some(code),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    pub image_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_accepts_string_ids_from_graphql() {
        let user: User = serde_json::from_value(json!({
            "id": "42",
            "name": "Ada",
            "username": "ada",
            "email": "ada@example.com",
            "bio": null,
            "avatarUrl": "https://img.example/ada.png",
            "createdAt": "2024-05-01T10:00:00+00:00",
            "updatedAt": "2024-05-01T10:00:00+00:00"
        }))
        .unwrap();

        assert_eq!(user.id, 42);
        assert_eq!(user.avatar_url.as_deref(), Some("https://img.example/ada.png"));
        assert!(user.bio.is_none());

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["id"], json!("42"));
    }

    #[test]
    fn test_numeric_ids_are_accepted_too() {
        let like: Like = serde_json::from_value(json!({
            "id": 1,
            "userId": 2,
            "postId": "3",
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!((like.id, like.user_id, like.post_id), (1, 2, 3));
    }

    #[test]
    fn test_delete_post_response_constructors() {
        let ok = DeletePostResponse::deleted(7);
        assert!(ok.success);
        assert_eq!(ok.message, "Post 7 deleted successfully");
        assert_eq!(ok.code, None);

        let denied = DeletePostResponse::failed(Some(7), ErrorCode::Forbidden, "nope");
        let json = serde_json::to_value(&denied).unwrap();
        assert_eq!(json["success"], json!(false));
        assert_eq!(json["id"], json!("7"));
        assert_eq!(json["code"], json!("FORBIDDEN"));

        let parsed: DeletePostResponse = serde_json::from_value(json!({
            "success": false,
            "message": "Authentication required",
            "id": null,
            "code": "UNAUTHENTICATED"
        }))
        .unwrap();
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.code, Some(ErrorCode::Unauthenticated));
    }

    #[test]
    fn test_post_view_defaults_missing_comments() {
        let view: PostView = serde_json::from_value(json!({
            "id": "5",
            "imageUrl": "https://img.example/p.jpg",
            "caption": "sunset",
            "createdAt": "2024-05-01T10:00:00Z",
            "author": {
                "id": "1",
                "name": "Ada",
                "username": "ada",
                "email": "ada@example.com",
                "createdAt": "2024-05-01T10:00:00Z",
                "updatedAt": "2024-05-01T10:00:00Z"
            },
            "likeCount": 3,
            "likedByCurrentUser": true
        }))
        .unwrap();
        assert!(view.comments.is_empty());
        assert_eq!(view.like_count, 3);
    }
}
