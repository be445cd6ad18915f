use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Like {
    pub id: i64,
    pub post_id: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Error)]
pub enum LikeError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Post not found")]
    PostNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_response_uses_camel_case_keys() {
        let response = LikeResponse {
            liked: true,
            like_count: 7,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["liked"], true);
        assert_eq!(json["likeCount"], 7);
    }
}
