use axum::{
    extract::{Extension, Multipart, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::post::model::{Location, PostError as ServiceError, PostResponse};
use crate::post::service::PostService;
use crate::upload::service::UploadedFile;
use crate::util::response::ErrorResponse;

#[derive(Debug, Deserialize)]
pub struct PostIdPathParam {
    id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchParams {
    /// Search term matched against post content
    pub q: String,
    /// Search every post instead of just the feed
    #[serde(default)]
    pub all: bool,
}

fn error_response(e: ServiceError) -> Response {
    let (status, body) = match e {
        ServiceError::NotFound => (
            StatusCode::NOT_FOUND,
            ErrorResponse {
                error: "Post not found".to_string(),
                code: "NOT_FOUND".to_string(),
            },
        ),
        ServiceError::Unauthorized => (
            StatusCode::FORBIDDEN,
            ErrorResponse {
                error: "You can only delete your own posts".to_string(),
                code: "FORBIDDEN".to_string(),
            },
        ),
        ServiceError::InvalidInput(msg) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse {
                error: msg,
                code: "INVALID_INPUT".to_string(),
            },
        ),
        ServiceError::UploadError(e) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse {
                error: e.to_string(),
                code: "UPLOAD_REJECTED".to_string(),
            },
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse {
                error: "Internal server error".to_string(),
                code: "INTERNAL_ERROR".to_string(),
            },
        ),
    };
    (status, Json(body)).into_response()
}

/// Create a post from a multipart form
///
/// Accepts `content`, an optional JSON-encoded `location`, and any number of
/// `mediaFiles` parts.
#[utoipa::path(
    post,
    path = "/posts",
    responses(
        (status = 201, description = "Post created successfully", body = PostResponse),
        (status = 400, description = "Empty post, oversized content or rejected file", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn create_post(
    user: AuthUser,
    Extension(service): Extension<Arc<PostService>>,
    mut multipart: Multipart,
) -> Response {
    let mut content = String::new();
    let mut location: Option<Location> = None;
    let mut media: Vec<UploadedFile> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!("Malformed multipart request: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: "Malformed multipart request".to_string(),
                        code: "INVALID_INPUT".to_string(),
                    }),
                )
                    .into_response();
            }
        };

        match field.name().unwrap_or_default() {
            "content" => {
                content = field.text().await.unwrap_or_default();
            }
            "location" => {
                let raw = field.text().await.unwrap_or_default();
                if !raw.is_empty() {
                    match serde_json::from_str::<Location>(&raw) {
                        Ok(parsed) => location = Some(parsed),
                        Err(e) => {
                            return error_response(ServiceError::InvalidInput(format!(
                                "Invalid location payload: {}",
                                e
                            )))
                        }
                    }
                }
            }
            "mediaFiles" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(data) if !data.is_empty() => media.push(UploadedFile {
                        file_name,
                        mime_type,
                        data: data.to_vec(),
                    }),
                    Ok(_) => {} // empty part, browser quirk
                    Err(e) => {
                        error!("Failed to read media part: {}", e);
                        return error_response(ServiceError::InvalidInput(
                            "Failed to read uploaded file".to_string(),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    info!(
        "Creating post for user {} with {} media files",
        user.user_id,
        media.len()
    );

    match service
        .create_post(user.user_id, &content, location, media)
        .await
    {
        Ok(post) => (StatusCode::CREATED, Json(post)).into_response(),
        Err(e) => {
            error!("Error creating post: {:?}", e);
            error_response(e)
        }
    }
}

/// Get a single post
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post retrieved", body = PostResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_post(
    Path(params): Path<PostIdPathParam>,
    Extension(service): Extension<Arc<PostService>>,
) -> Response {
    match service.get_post(params.id).await {
        Ok(post) => (StatusCode::OK, Json(post)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Feed of the authenticated user's and their friends' posts
#[utoipa::path(
    get,
    path = "/api/posts/feed",
    responses(
        (status = 200, description = "Feed retrieved", body = [PostResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_feed(
    user: AuthUser,
    Extension(service): Extension<Arc<PostService>>,
) -> Response {
    match service.feed(user.user_id).await {
        Ok(posts) => (StatusCode::OK, Json(posts)).into_response(),
        Err(e) => {
            error!("Error retrieving feed: {:?}", e);
            error_response(e)
        }
    }
}

/// Search posts by content
#[utoipa::path(
    get,
    path = "/api/posts/search",
    params(
        ("q" = String, Query, description = "Search term"),
        ("all" = Option<bool>, Query, description = "Search all posts instead of the feed")
    ),
    responses(
        (status = 200, description = "Matching posts", body = [PostResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn search_posts(
    user: AuthUser,
    Query(params): Query<SearchParams>,
    Extension(service): Extension<Arc<PostService>>,
) -> Response {
    let result = if params.all {
        service.search_all(&params.q).await
    } else {
        service.search_feed(user.user_id, &params.q).await
    };

    match result {
        Ok(posts) => (StatusCode::OK, Json(posts)).into_response(),
        Err(e) => {
            error!("Error searching posts: {:?}", e);
            error_response(e)
        }
    }
}

/// Delete a post
///
/// Only the owner may delete; media files and dependent rows go with it.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the post owner", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn delete_post(
    user: AuthUser,
    Path(params): Path<PostIdPathParam>,
    Extension(service): Extension<Arc<PostService>>,
) -> Response {
    match service.delete_post(params.id, user.user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Error deleting post: {:?}", e);
            error_response(e)
        }
    }
}
