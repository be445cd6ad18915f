use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Security scheme configuration for OpenAPI
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Social Network Backend API",
        version = "0.1.0",
        description = "REST and WebSocket API for the social network backend"
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::protected_health_check,
        crate::auth::controller::login,
        crate::auth::controller::register,
        crate::post::controller::create_post,
        crate::post::controller::get_post,
        crate::post::controller::get_feed,
        crate::post::controller::search_posts,
        crate::post::controller::delete_post,
        crate::like::controller::like_post,
        crate::like::controller::unlike_post,
        crate::comment::controller::create_comment,
        crate::comment::controller::get_comments,
        crate::comment::controller::delete_comment,
        crate::share::controller::share_post,
        crate::share::controller::unshare_post,
        crate::share::controller::share_status,
        crate::friend::controller::send_request,
        crate::friend::controller::accept_request,
        crate::friend::controller::decline_request,
        crate::friend::controller::get_friends,
        crate::notification::controller::get_notifications,
        crate::notification::controller::get_unread_count,
        crate::notification::controller::get_unread,
        crate::notification::controller::mark_as_read,
        crate::notification::controller::mark_all_read
    ),
    components(
        schemas(
            crate::auth::controller::RegisterRequest,
            crate::auth::controller::LoginRequest,
            crate::auth::controller::AuthResponse,
            crate::util::response::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::post::model::PostResponse,
            crate::post::model::Location,
            crate::post::model::UserBrief,
            crate::post::model::MediaResponse,
            crate::like::model::LikeResponse,
            crate::comment::model::CommentRequest,
            crate::comment::model::CommentResponse,
            crate::comment::model::CommentAuthor,
            crate::share::model::ShareRequest,
            crate::share::model::ShareResponse,
            crate::share::model::ShareStatusResponse,
            crate::friend::model::FriendRequestResponse,
            crate::friend::model::FriendResponse,
            crate::notification::model::NotificationType,
            crate::notification::model::NotificationDto,
            crate::notification::model::NotificationPage,
            crate::notification::controller::CountResponse,
            crate::notification::controller::MarkReadResponse,
            crate::notification::controller::MarkAllReadResponse
        )
    ),
    tags(
        (name = "authentication", description = "Authentication endpoints"),
        (name = "health", description = "Health check endpoints"),
        (name = "posts", description = "Post creation, feed, and search endpoints"),
        (name = "likes", description = "Post like endpoints"),
        (name = "comments", description = "Comment management endpoints"),
        (name = "shares", description = "Post share endpoints"),
        (name = "friends", description = "Friend request and friend list endpoints"),
        (name = "notifications", description = "Notification endpoints")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
