use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Error body returned by every JSON endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub fn error_json(status: StatusCode, error: impl Into<String>, code: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_carries_message_and_code() {
        let body = ErrorResponse {
            error: "Post not found".to_string(),
            code: "NOT_FOUND".to_string(),
        };

        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""error":"Post not found""#));
        assert!(json.contains(r#""code":"NOT_FOUND""#));
    }

    #[test]
    fn error_json_sets_the_status() {
        let response = error_json(StatusCode::NOT_FOUND, "Post not found", "NOT_FOUND");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
