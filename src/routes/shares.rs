use crate::auth::middleware::auth_middleware;
use crate::share::controller;
use crate::share::service::ShareService;
use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

pub fn routes(share_service: Arc<ShareService>) -> Router {
    Router::new()
        .route(
            "/api/shares/:post_id",
            post(controller::share_post).delete(controller::unshare_post),
        )
        .route("/api/shares/:post_id/status", get(controller::share_status))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(share_service))
}
