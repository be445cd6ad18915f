use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::auth::middleware::AuthUser;
use crate::share::model::{ShareError, ShareRequest, ShareResponse, ShareStatusResponse};
use crate::share::service::ShareService;
use crate::util::response::ErrorResponse;

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Post not found".to_string(),
            code: "NOT_FOUND".to_string(),
        }),
    )
        .into_response()
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message,
            code: "INVALID_INPUT".to_string(),
        }),
    )
        .into_response()
}

fn internal_error(context: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: context.to_string(),
            code: "INTERNAL_ERROR".to_string(),
        }),
    )
        .into_response()
}

/// Share a post into the caller's feed
///
/// Sharing twice is benign: the second call reports the share as already
/// present and leaves the count unchanged.
#[utoipa::path(
    post,
    path = "/api/shares/{post_id}",
    params(("post_id" = i64, Path, description = "Original post ID")),
    request_body = ShareRequest,
    responses(
        (status = 200, description = "Shared, or already shared", body = ShareResponse),
        (status = 400, description = "Share text too long, or the post is itself a shared copy", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "shares"
)]
pub async fn share_post(
    user: AuthUser,
    Path(post_id): Path<i64>,
    Extension(service): Extension<Arc<ShareService>>,
    body: Option<Json<ShareRequest>>,
) -> Response {
    let share_text = body.and_then(|Json(req)| req.share_text);

    match service
        .share_post(post_id, user.user_id, share_text.as_deref())
        .await
    {
        Ok(shared_post_id) => match service.share_count(post_id).await {
            Ok(count) => (
                StatusCode::OK,
                Json(ShareResponse {
                    shared: true,
                    share_count: count,
                    shared_post_id: Some(shared_post_id),
                    message: "Post shared successfully!".to_string(),
                }),
            )
                .into_response(),
            Err(e) => {
                error!("Error reading share count: {:?}", e);
                internal_error("Failed to share post")
            }
        },
        Err(ShareError::AlreadyShared) => {
            let count = service.share_count(post_id).await.unwrap_or(0);
            (
                StatusCode::OK,
                Json(ShareResponse {
                    shared: true,
                    share_count: count,
                    shared_post_id: None,
                    message: "User has already shared this post".to_string(),
                }),
            )
                .into_response()
        }
        Err(ShareError::PostNotFound) => not_found(),
        Err(e @ ShareError::SharedCopy) => bad_request(e.to_string()),
        Err(ShareError::InvalidInput(msg)) => bad_request(msg),
        Err(e) => {
            error!("Error sharing post: {:?}", e);
            internal_error("Failed to share post")
        }
    }
}

/// Remove the caller's share of a post
#[utoipa::path(
    delete,
    path = "/api/shares/{post_id}",
    params(("post_id" = i64, Path, description = "Original post ID")),
    responses(
        (status = 200, description = "Unshared, or nothing to unshare", body = ShareResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "shares"
)]
pub async fn unshare_post(
    user: AuthUser,
    Path(post_id): Path<i64>,
    Extension(service): Extension<Arc<ShareService>>,
) -> Response {
    match service.post_exists(post_id).await {
        Ok(false) => return not_found(),
        Ok(true) => {}
        Err(e) => {
            error!("Error checking post: {:?}", e);
            return internal_error("Failed to unshare post");
        }
    }

    match service.unshare_post(post_id, user.user_id).await {
        Ok(removed) => {
            let count = service.share_count(post_id).await.unwrap_or(0);
            (
                StatusCode::OK,
                Json(ShareResponse {
                    shared: false,
                    share_count: count,
                    shared_post_id: None,
                    message: if removed {
                        "Share removed successfully!".to_string()
                    } else {
                        "Post was not shared".to_string()
                    },
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Error unsharing post: {:?}", e);
            internal_error("Failed to unshare post")
        }
    }
}

/// Share status of a post for the caller
#[utoipa::path(
    get,
    path = "/api/shares/{post_id}/status",
    params(("post_id" = i64, Path, description = "Original post ID")),
    responses(
        (status = 200, description = "Share status", body = ShareStatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "shares"
)]
pub async fn share_status(
    user: AuthUser,
    Path(post_id): Path<i64>,
    Extension(service): Extension<Arc<ShareService>>,
) -> Response {
    match service.post_exists(post_id).await {
        Ok(false) => return not_found(),
        Ok(true) => {}
        Err(e) => {
            error!("Error checking post: {:?}", e);
            return internal_error("Failed to get share status");
        }
    }

    let shared = service.is_shared(post_id, user.user_id).await;
    let count = service.share_count(post_id).await;

    match (shared, count) {
        (Ok(shared), Ok(share_count)) => (
            StatusCode::OK,
            Json(ShareStatusResponse {
                shared,
                share_count,
            }),
        )
            .into_response(),
        (shared, count) => {
            error!("Error getting share status: {:?} / {:?}", shared, count);
            internal_error("Failed to get share status")
        }
    }
}
