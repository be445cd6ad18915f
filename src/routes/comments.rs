use crate::auth::middleware::auth_middleware;
use crate::comment::controller;
use crate::comment::service::CommentService;
use axum::{
    middleware,
    routing::{delete, get},
    Extension, Router,
};
use std::sync::Arc;

pub fn routes(comment_service: Arc<CommentService>) -> Router {
    Router::new()
        .route(
            "/api/posts/:id/comments",
            get(controller::get_comments).post(controller::create_comment),
        )
        .route(
            "/api/comments/:id",
            delete(controller::delete_comment),
        )
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(comment_service))
}
