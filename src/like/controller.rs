use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::auth::middleware::AuthUser;
use crate::like::model::{LikeError, LikeResponse};
use crate::like::service::LikeService;
use crate::util::response::ErrorResponse;

fn error_response(e: LikeError, context: &str) -> Response {
    match e {
        LikeError::PostNotFound => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Post not found".to_string(),
                code: "NOT_FOUND".to_string(),
            }),
        )
            .into_response(),
        LikeError::DatabaseError(e) => {
            error!("{}: {:?}", context, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: context.to_string(),
                    code: "INTERNAL_ERROR".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Like a post
#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post liked", body = LikeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn like_post(
    user: AuthUser,
    Path(post_id): Path<i64>,
    Extension(service): Extension<Arc<LikeService>>,
) -> Response {
    match service.like_post(post_id, user.user_id).await {
        Ok(like_count) => (
            StatusCode::OK,
            Json(LikeResponse {
                liked: true,
                like_count,
            }),
        )
            .into_response(),
        Err(e) => error_response(e, "Failed to like post"),
    }
}

/// Remove a like from a post
#[utoipa::path(
    delete,
    path = "/api/posts/{id}/like",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Like removed", body = LikeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn unlike_post(
    user: AuthUser,
    Path(post_id): Path<i64>,
    Extension(service): Extension<Arc<LikeService>>,
) -> Response {
    match service.unlike_post(post_id, user.user_id).await {
        Ok(like_count) => (
            StatusCode::OK,
            Json(LikeResponse {
                liked: false,
                like_count,
            }),
        )
            .into_response(),
        Err(e) => error_response(e, "Failed to unlike post"),
    }
}
