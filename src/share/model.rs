use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Share {
    pub id: i64,
    pub original_post_id: i64,
    pub shared_post_id: i64,
    pub user_id: Uuid,
    pub share_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ShareRequest {
    /// Optional text shown on the shared copy
    #[serde(rename = "shareText")]
    pub share_text: Option<String>,
}

/// Response for share and unshare calls
#[derive(Debug, Serialize, ToSchema)]
pub struct ShareResponse {
    pub shared: bool,
    #[serde(rename = "shareCount")]
    pub share_count: i64,
    #[serde(rename = "sharedPostId", skip_serializing_if = "Option::is_none")]
    pub shared_post_id: Option<i64>,
    pub message: String,
}

/// Response for the status lookup
#[derive(Debug, Serialize, ToSchema)]
pub struct ShareStatusResponse {
    pub shared: bool,
    #[serde(rename = "shareCount")]
    pub share_count: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Post not found")]
    PostNotFound,

    #[error("User has already shared this post")]
    AlreadyShared,

    #[error("Shared posts cannot be shared again")]
    SharedCopy,

    #[error("{0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_response_uses_camel_case_keys() {
        let response = ShareResponse {
            shared: true,
            share_count: 1,
            shared_post_id: Some(99),
            message: "Post shared successfully!".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""shareCount":1"#));
        assert!(json.contains(r#""sharedPostId":99"#));
    }

    #[test]
    fn missing_share_text_is_accepted() {
        let request: ShareRequest = serde_json::from_str("{}").unwrap();
        assert!(request.share_text.is_none());

        let request: ShareRequest = serde_json::from_str(r#"{"shareText":"nice"}"#).unwrap();
        assert_eq!(request.share_text.as_deref(), Some("nice"));
    }
}
