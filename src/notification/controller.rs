use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::notification::model::{NotificationDto, NotificationError, NotificationPage};
use crate::notification::service::NotificationService;
use crate::util::response::ErrorResponse;

#[derive(Debug, Deserialize)]
pub struct NotificationIdPathParam {
    id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PageParams {
    /// Zero-based page index
    #[schema(example = "0", default = "0")]
    page: Option<i64>,
    /// Page size
    #[schema(example = "10", default = "10", minimum = 1, maximum = 100)]
    size: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub success: bool,
    pub updated: u64,
}

fn internal_error(context: &str, e: NotificationError) -> Response {
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

/// List notifications for the authenticated user, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("page" = Option<i64>, Query, description = "Zero-based page index"),
        ("size" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Notifications retrieved", body = NotificationPage),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn get_notifications(
    user: AuthUser,
    Query(params): Query<PageParams>,
    Extension(service): Extension<Arc<NotificationService>>,
) -> Response {
    let page = params.page.unwrap_or(0).max(0);
    let size = params.size.unwrap_or(10).clamp(1, 100);

    match service.list(user.user_id, page, size).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => internal_error("Failed to retrieve notifications", e),
    }
}

/// Get the unread notification count
#[utoipa::path(
    get,
    path = "/api/notifications/count",
    responses(
        (status = 200, description = "Unread count retrieved", body = CountResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn get_unread_count(
    user: AuthUser,
    Extension(service): Extension<Arc<NotificationService>>,
) -> Response {
    match service.unread_count(user.user_id).await {
        Ok(count) => (StatusCode::OK, Json(CountResponse { count })).into_response(),
        Err(e) => internal_error("Failed to retrieve unread count", e),
    }
}

/// List unread notifications (for the dropdown)
#[utoipa::path(
    get,
    path = "/api/notifications/unread",
    responses(
        (status = 200, description = "Unread notifications retrieved", body = [NotificationDto]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn get_unread(
    user: AuthUser,
    Extension(service): Extension<Arc<NotificationService>>,
) -> Response {
    match service.unread(user.user_id).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => internal_error("Failed to retrieve unread notifications", e),
    }
}

/// Mark one notification as read
///
/// Has no effect when the notification belongs to another user.
#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(("id" = i64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Read flag updated", body = MarkReadResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_as_read(
    user: AuthUser,
    Path(params): Path<NotificationIdPathParam>,
    Extension(service): Extension<Arc<NotificationService>>,
) -> Response {
    match service.mark_as_read(params.id, user.user_id).await {
        Ok(success) => (StatusCode::OK, Json(MarkReadResponse { success })).into_response(),
        Err(e) => internal_error("Failed to mark notification as read", e),
    }
}

/// Mark every notification as read
#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked read", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_all_read(
    user: AuthUser,
    Extension(service): Extension<Arc<NotificationService>>,
) -> Response {
    match service.mark_all_read(user.user_id).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(MarkAllReadResponse {
                success: true,
                updated,
            }),
        )
            .into_response(),
        Err(e) => internal_error("Failed to mark all notifications as read", e),
    }
}
