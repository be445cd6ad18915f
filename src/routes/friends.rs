use crate::auth::middleware::auth_middleware;
use crate::friend::controller;
use crate::friend::service::FriendService;
use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

pub fn routes(friend_service: Arc<FriendService>) -> Router {
    Router::new()
        .route("/api/friends", get(controller::get_friends))
        .route(
            "/api/friends/requests/:id",
            post(controller::send_request),
        )
        .route(
            "/api/friends/requests/:id/accept",
            post(controller::accept_request),
        )
        .route(
            "/api/friends/requests/:id/decline",
            post(controller::decline_request),
        )
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(friend_service))
}
