use crate::auth::middleware::auth_middleware;
use crate::like::controller;
use crate::like::service::LikeService;
use axum::{middleware, routing::post, Extension, Router};
use std::sync::Arc;

pub fn routes(like_service: Arc<LikeService>) -> Router {
    Router::new()
        .route(
            "/api/posts/:id/like",
            post(controller::like_post).delete(controller::unlike_post),
        )
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(like_service))
}
