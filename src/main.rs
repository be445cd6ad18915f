mod api_doc;
mod auth;
mod comment;
mod config;
mod db;
mod friend;
mod like;
mod notification;
mod post;
mod routes;
mod share;
mod upload;
mod util;
mod websocket;

use axum::{routing::get, Router};
use dotenv::dotenv;
use redis::Client;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use tower_http::services::ServeDir;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::comment::service::CommentService;
use crate::config::AppConfig;
use crate::friend::service::FriendService;
use crate::like::service::LikeService;
use crate::notification::service::NotificationService;
use crate::post::service::PostService;
use crate::share::service::ShareService;
use crate::upload::service::FileStore;
use crate::websocket::notifications::NotificationState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Load .env file if it exists
    dotenv().ok();

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    if !db::check_db_initialized(&pool).await {
        db::init_db(&pool).await?;
    }

    let redis_client = match &config.redis_url {
        Some(url) => {
            info!("Connecting to Redis at {}", url);
            match Client::open(url.clone()) {
                Ok(client) => Some(client),
                Err(e) => {
                    error!("Failed to connect to Redis, live pushes disabled: {}", e);
                    None
                }
            }
        }
        None => {
            info!("No Redis URL configured, live pushes disabled");
            None
        }
    };

    let file_store = FileStore::new(&config.upload_dir);

    let notification_service = Arc::new(NotificationService::new(
        pool.clone(),
        redis_client.clone(),
    ));
    let friend_service = Arc::new(FriendService::new(
        pool.clone(),
        notification_service.clone(),
    ));
    let like_service = Arc::new(LikeService::new(pool.clone(), notification_service.clone()));
    let comment_service = Arc::new(CommentService::new(
        pool.clone(),
        notification_service.clone(),
    ));
    let share_service = Arc::new(ShareService::new(pool.clone()));
    let post_service = Arc::new(PostService::new(
        pool.clone(),
        file_store,
        friend_service.clone(),
        notification_service.clone(),
    ));

    // Prune notifications older than the retention window once a day
    let cleanup_service = notification_service.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
        loop {
            interval.tick().await;
            if let Err(e) = cleanup_service.cleanup(30).await {
                error!("Notification cleanup failed: {:?}", e);
            }
        }
    });

    let notification_state = Arc::new(NotificationState {
        redis_client: redis_client.clone(),
        notification_service: notification_service.clone(),
    });

    let app = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::routes(pool.clone()))
        .merge(routes::auth::routes(pool.clone()))
        .merge(routes::posts::routes(post_service))
        .merge(routes::likes::routes(like_service))
        .merge(routes::comments::routes(comment_service))
        .merge(routes::shares::routes(share_service))
        .merge(routes::friends::routes(friend_service))
        .merge(routes::notifications::routes(
            notification_service,
            notification_state,
        ))
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .route("/", get(|| async { "Welcome to the Social Network API" }));

    // Walk forward from the configured port if it is taken
    let mut addr = config.bind_addr;
    let max_tries = 5;
    for attempt in 1..=max_tries {
        match axum::Server::try_bind(&addr) {
            Ok(server) => {
                info!("Server started at http://{}", addr);
                info!("API documentation at http://{}/docs", addr);
                info!(
                    "WebSocket notifications at ws://{}/api/notifications/ws?token=<JWT>",
                    addr
                );
                return server
                    .serve(app.into_make_service())
                    .await
                    .map_err(|e| e.into());
            }
            Err(e) => {
                if attempt == max_tries {
                    return Err(format!("Failed to bind to any port: {}", e).into());
                }
                addr = SocketAddr::new(addr.ip(), addr.port() + 1);
            }
        }
    }

    Err("Failed to bind to any port".into())
}
