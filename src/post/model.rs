use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_CONTENT_LENGTH: usize = 280;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Post {
    pub id: i64,
    pub content: String,
    pub user_id: Uuid,
    pub shared_post_id: Option<i64>,
    pub is_shared_post: bool,
    pub location_name: Option<String>,
    pub location_latitude: Option<f64>,
    pub location_longitude: Option<f64>,
    pub location_type: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub share_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PostMedia {
    pub id: i64,
    pub post_id: i64,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub mime_type: String,
    pub file_size: i64,
    pub upload_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Optional location attached to a post
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// "city", "current" or "custom"
    #[serde(rename = "type")]
    pub location_type: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserBrief {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub name: String,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    pub id: i64,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub mime_type: String,
    pub file_size: i64,
    pub upload_order: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub content: String,
    pub author: UserBrief,
    pub is_shared_post: bool,
    pub shared_post_id: Option<i64>,
    pub media: Vec<MediaResponse>,
    pub location: Option<Location>,
    pub like_count: i64,
    pub comment_count: i64,
    pub share_count: i64,
    /// Compact relative timestamp, e.g. "3m", "5h"
    pub time_ago: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Post not found")]
    NotFound,

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload failed: {0}")]
    UploadError(#[from] crate::upload::service::UploadError),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_json_uses_short_field_names() {
        let location = Location {
            name: "Berlin".to_string(),
            lat: 52.52,
            lng: 13.405,
            location_type: "city".to_string(),
        };

        let json = serde_json::to_string(&location).unwrap();
        assert!(json.contains(r#""lat":52.52"#));
        assert!(json.contains(r#""lng":13.405"#));
        assert!(json.contains(r#""type":"city""#));

        let parsed: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, location);
    }
}
