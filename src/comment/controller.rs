use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::auth::middleware::AuthUser;
use crate::comment::model::{CommentError, CommentRequest, CommentResponse};
use crate::comment::service::CommentService;
use crate::util::response::ErrorResponse;

fn error_response(e: CommentError, context: &str) -> Response {
    let (status, message, code) = match e {
        CommentError::PostNotFound => (StatusCode::NOT_FOUND, "Post not found".to_string(), "NOT_FOUND"),
        CommentError::NotFound => (StatusCode::NOT_FOUND, "Comment not found".to_string(), "NOT_FOUND"),
        CommentError::Unauthorized => (
            StatusCode::FORBIDDEN,
            "You can only delete your own comments".to_string(),
            "FORBIDDEN",
        ),
        CommentError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg, "INVALID_INPUT"),
        CommentError::DatabaseError(e) => {
            error!("{}: {:?}", context, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                context.to_string(),
                "INTERNAL_ERROR",
            )
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        }),
    )
        .into_response()
}

/// Comment on a post
#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Empty comment", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn create_comment(
    user: AuthUser,
    Path(post_id): Path<i64>,
    Extension(service): Extension<Arc<CommentService>>,
    Json(request): Json<CommentRequest>,
) -> Response {
    match service
        .create_comment(post_id, user.user_id, &request.content)
        .await
    {
        Ok(comment) => (StatusCode::CREATED, Json(comment)).into_response(),
        Err(e) => error_response(e, "Failed to create comment"),
    }
}

/// Comments on a post, oldest first
#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Comments for the post", body = [CommentResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn get_comments(
    _user: AuthUser,
    Path(post_id): Path<i64>,
    Extension(service): Extension<Arc<CommentService>>,
) -> Response {
    match service.list_comments(post_id).await {
        Ok(comments) => (StatusCode::OK, Json(comments)).into_response(),
        Err(e) => error_response(e, "Failed to load comments"),
    }
}

/// Delete a comment
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the comment author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn delete_comment(
    user: AuthUser,
    Path(comment_id): Path<i64>,
    Extension(service): Extension<Arc<CommentService>>,
) -> Response {
    match service.delete_comment(comment_id, user.user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e, "Failed to delete comment"),
    }
}
