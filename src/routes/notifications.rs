use crate::auth::middleware::auth_middleware;
use crate::notification::controller;
use crate::notification::service::NotificationService;
use crate::websocket::notifications::{ws_handler, NotificationState};
use axum::{
    middleware,
    routing::{get, put},
    Extension, Router,
};
use std::sync::Arc;

pub fn routes(
    notification_service: Arc<NotificationService>,
    notification_state: Arc<NotificationState>,
) -> Router {
    // Token auth for the socket happens inside the handler; the query string
    // carries the JWT because browsers cannot set headers on WebSocket upgrades
    let ws_routes = Router::new()
        .route("/api/notifications/ws", get(ws_handler))
        .with_state(notification_state);

    let rest_routes = Router::new()
        .route("/api/notifications", get(controller::get_notifications))
        .route("/api/notifications/count", get(controller::get_unread_count))
        .route("/api/notifications/unread", get(controller::get_unread))
        .route("/api/notifications/read-all", put(controller::mark_all_read))
        .route("/api/notifications/:id/read", put(controller::mark_as_read))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(notification_service));

    ws_routes.merge(rest_routes)
}
