use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::auth::middleware::AuthUser;
use crate::friend::model::{FriendError, FriendRequestResponse, FriendResponse, Friendship};
use crate::friend::service::FriendService;
use crate::util::response::ErrorResponse;

fn error_response(e: FriendError, context: &str) -> Response {
    let (status, message, code) = match e {
        FriendError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string(), "NOT_FOUND"),
        FriendError::RequestNotFound => (
            StatusCode::NOT_FOUND,
            "Friend request not found".to_string(),
            "NOT_FOUND",
        ),
        FriendError::Unauthorized => (
            StatusCode::FORBIDDEN,
            "Only the recipient can respond to a friend request".to_string(),
            "FORBIDDEN",
        ),
        FriendError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg, "INVALID_REQUEST"),
        FriendError::AlreadyExists => (
            StatusCode::CONFLICT,
            "A friend request already exists between these users".to_string(),
            "ALREADY_EXISTS",
        ),
        FriendError::DatabaseError(e) => {
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

fn to_request_response(friendship: Friendship) -> FriendRequestResponse {
    FriendRequestResponse {
        id: friendship.id,
        requester_id: friendship.requester_id,
        addressee_id: friendship.addressee_id,
        status: friendship.status.as_str().to_string(),
        created_at: friendship.created_at,
    }
}

/// Send a friend request
#[utoipa::path(
    post,
    path = "/api/friends/requests/{id}",
    params(("id" = String, Path, description = "Addressee user ID")),
    responses(
        (status = 201, description = "Friend request sent", body = FriendRequestResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Request already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn send_request(
    user: AuthUser,
    Path(user_id): Path<uuid::Uuid>,
    Extension(service): Extension<Arc<FriendService>>,
) -> Response {
    match service.send_request(user.user_id, user_id).await {
        Ok(friendship) => {
            (StatusCode::CREATED, Json(to_request_response(friendship))).into_response()
        }
        Err(e) => error_response(e, "Failed to send friend request"),
    }
}

/// Accept a friend request
#[utoipa::path(
    post,
    path = "/api/friends/requests/{id}/accept",
    params(("id" = i64, Path, description = "Friend request ID")),
    responses(
        (status = 200, description = "Friend request accepted", body = FriendRequestResponse),
        (status = 400, description = "Request already resolved", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the recipient", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn accept_request(
    user: AuthUser,
    Path(request_id): Path<i64>,
    Extension(service): Extension<Arc<FriendService>>,
) -> Response {
    match service.accept(request_id, user.user_id).await {
        Ok(friendship) => (StatusCode::OK, Json(to_request_response(friendship))).into_response(),
        Err(e) => error_response(e, "Failed to accept friend request"),
    }
}

/// Decline a friend request
#[utoipa::path(
    post,
    path = "/api/friends/requests/{id}/decline",
    params(("id" = i64, Path, description = "Friend request ID")),
    responses(
        (status = 200, description = "Friend request declined", body = FriendRequestResponse),
        (status = 400, description = "Request already resolved", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the recipient", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn decline_request(
    user: AuthUser,
    Path(request_id): Path<i64>,
    Extension(service): Extension<Arc<FriendService>>,
) -> Response {
    match service.decline(request_id, user.user_id).await {
        Ok(friendship) => (StatusCode::OK, Json(to_request_response(friendship))).into_response(),
        Err(e) => error_response(e, "Failed to decline friend request"),
    }
}

/// List the caller's accepted friends
#[utoipa::path(
    get,
    path = "/api/friends",
    responses(
        (status = 200, description = "Accepted friends", body = [FriendResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "friends"
)]
pub async fn get_friends(
    user: AuthUser,
    Extension(service): Extension<Arc<FriendService>>,
) -> Response {
    match service.friends(user.user_id).await {
        Ok(friends) => (StatusCode::OK, Json(friends)).into_response(),
        Err(e) => error_response(e, "Failed to load friends"),
    }
}
