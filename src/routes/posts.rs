use crate::auth::middleware::auth_middleware;
use crate::post::controller;
use crate::post::service::PostService;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

// Room for the 50 MiB video ceiling plus multipart framing overhead
const MAX_UPLOAD_BODY_BYTES: usize = 60 * 1024 * 1024;

pub fn routes(post_service: Arc<PostService>) -> Router {
    Router::new()
        .route(
            "/posts",
            post(controller::create_post).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES)),
        )
        // Order matters here - more specific routes first
        .route("/api/posts/feed", get(controller::get_feed))
        .route("/api/posts/search", get(controller::search_posts))
        .route(
            "/api/posts/:id",
            get(controller::get_post).delete(controller::delete_post),
        )
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(post_service))
}
