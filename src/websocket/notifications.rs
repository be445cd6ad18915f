use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use redis::{AsyncCommands, Client};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, time};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::jwt::validate_token;
use crate::notification::model::LiveMessage;
use crate::notification::service::NotificationService;

const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Query parameters for WebSocket connections
#[derive(Debug, Deserialize)]
pub struct WebSocketParams {
    token: Option<String>,
}

/// Shared state for the live notification channel
pub struct NotificationState {
    pub redis_client: Option<Client>,
    pub notification_service: Arc<NotificationService>,
}

/// Redis channel carrying one user's live messages
pub fn user_channel(user_id: &Uuid) -> String {
    format!("notifications:user:{}", user_id)
}

/// Publish a live message to a user's channel, best effort
pub async fn publish_to_user(
    client: &Client,
    user_id: &Uuid,
    message: &LiveMessage,
) -> Result<(), redis::RedisError> {
    let json = serde_json::to_string(message).map_err(|e| {
        redis::RedisError::from((redis::ErrorKind::TypeError, "serialize", e.to_string()))
    })?;

    let mut conn = client.get_multiplexed_async_connection().await?;
    let _: () = conn.publish(user_channel(user_id), json).await?;
    Ok(())
}

/// Handle an invalid socket connection (authentication failure)
async fn handle_invalid_socket(mut socket: WebSocket, error_message: String) {
    if let Err(e) = socket
        .send(Message::Text(format!(
            r#"{{"error": "{}"}}"#,
            error_message
        )))
        .await
    {
        error!("Error sending error message on WS: {}", e);
    }

    let _ = socket.close().await;
}

/// Handle an authenticated WebSocket connection
async fn handle_valid_connection(
    socket: WebSocket,
    user_id: Uuid,
    state: Arc<NotificationState>,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(100);

    // A fresh subscriber learns its unread count right away
    match state.notification_service.unread_count(user_id).await {
        Ok(count) => {
            if let Ok(json) = serde_json::to_string(&LiveMessage::UnreadCount { count }) {
                let _ = tx.send(Message::Text(json)).await;
            }
        }
        Err(e) => error!("Failed to fetch initial unread count: {}", e),
    }

    // Forward Redis pub/sub messages into the channel
    let redis_task = state.redis_client.clone().map(|client| {
        let tx_redis = tx.clone();
        tokio::spawn(async move {
            subscribe_to_user_channel(user_id, client, tx_redis).await;
        })
    });

    // Forward channel messages to the WebSocket
    let forward_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_sender.send(message).await {
                error!("Error forwarding message to WebSocket: {}", e);
                break;
            }
        }
    });

    // Heartbeat keeps the connection alive through idle proxies
    let tx_heartbeat = tx.clone();
    let heartbeat_task = tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
        loop {
            interval.tick().await;
            if tx_heartbeat.send(Message::Ping(vec![])).await.is_err() {
                break;
            }
        }
    });

    // Process incoming WebSocket messages until the client leaves
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                info!("WebSocket closed by client");
                break;
            }
            Ok(Message::Pong(_)) => {
                debug!("Received pong from client");
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    if let Some(task) = redis_task {
        task.abort();
    }
    forward_task.abort();
    heartbeat_task.abort();

    info!("WebSocket connection closed for user: {}", user_id);
}

/// Handle incoming WebSocket connection
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WebSocketParams>,
    State(state): State<Arc<NotificationState>>,
) -> impl IntoResponse {
    let token = params.token.unwrap_or_default();

    let user_id = match validate_token(&token) {
        Ok(claims) => match Uuid::parse_str(&claims.sub) {
            Ok(uuid) => uuid,
            Err(e) => {
                let error_message = format!("Invalid user ID in token: {}", e);
                return ws.on_upgrade(move |socket| async move {
                    handle_invalid_socket(socket, error_message).await;
                });
            }
        },
        Err(e) => {
            let error_message = format!("Invalid token: {}", e);
            return ws.on_upgrade(move |socket| async move {
                handle_invalid_socket(socket, error_message).await;
            });
        }
    };

    info!("User {} connected to notifications WebSocket", user_id);
    ws.on_upgrade(move |socket| async move {
        handle_valid_connection(socket, user_id, state).await;
    })
}

/// Subscribe to the user's Redis channel and forward payloads verbatim
async fn subscribe_to_user_channel(user_id: Uuid, client: Client, tx: mpsc::Sender<Message>) {
    let channel_name = user_channel(&user_id);

    let mut pubsub = match client.get_async_pubsub().await {
        Ok(pubsub) => pubsub,
        Err(e) => {
            error!("Failed to get Redis PubSub connection: {}", e);
            return;
        }
    };

    if let Err(e) = pubsub.subscribe(&channel_name).await {
        error!("Failed to subscribe to Redis channel: {}", e);
        return;
    }

    debug!("Subscribed to Redis channel: {}", channel_name);

    let mut pubsub_stream = pubsub.on_message();
    while let Some(msg) = pubsub_stream.next().await {
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to get message payload: {}", e);
                continue;
            }
        };

        if let Err(e) = tx.send(Message::Text(payload)).await {
            error!("Failed to forward Redis message to WebSocket: {}", e);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_channel_format() {
        let user_id = Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap();
        assert_eq!(
            user_channel(&user_id),
            "notifications:user:123e4567-e89b-12d3-a456-426614174000"
        );
    }

    #[test]
    fn websocket_params_accept_missing_token() {
        let params = WebSocketParams { token: None };
        assert!(params.token.is_none());

        let params = WebSocketParams {
            token: Some("abc".to_string()),
        };
        assert_eq!(params.token.unwrap(), "abc");
    }

    #[test]
    fn error_message_format() {
        let error_msg = format!(r#"{{"error": "{}"}}"#, "Invalid token");
        assert_eq!(error_msg, r#"{"error": "Invalid token"}"#);
    }
}
