use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// The action that produced a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    FriendRequestReceived,
    FriendRequestAccepted,
    FriendRequestDeclined,
    PostLiked,
    PostCommented,
    FriendPostCreated,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FriendRequestReceived => "FRIEND_REQUEST_RECEIVED",
            Self::FriendRequestAccepted => "FRIEND_REQUEST_ACCEPTED",
            Self::FriendRequestDeclined => "FRIEND_REQUEST_DECLINED",
            Self::PostLiked => "POST_LIKED",
            Self::PostCommented => "POST_COMMENTED",
            Self::FriendPostCreated => "FRIEND_POST_CREATED",
        }
    }

    /// Message appended to the actor's name when no custom message is given
    pub fn default_message(self) -> &'static str {
        match self {
            Self::FriendRequestReceived => "sent you a friend request",
            Self::FriendRequestAccepted => "accepted your friend request",
            Self::FriendRequestDeclined => "declined your friend request",
            Self::PostLiked => "liked your post",
            Self::PostCommented => "commented on your post",
            Self::FriendPostCreated => "created a new post",
        }
    }
}

impl TryFrom<String> for NotificationType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "FRIEND_REQUEST_RECEIVED" => Ok(Self::FriendRequestReceived),
            "FRIEND_REQUEST_ACCEPTED" => Ok(Self::FriendRequestAccepted),
            "FRIEND_REQUEST_DECLINED" => Ok(Self::FriendRequestDeclined),
            "POST_LIKED" => Ok(Self::PostLiked),
            "POST_COMMENTED" => Ok(Self::PostCommented),
            "FRIEND_POST_CREATED" => Ok(Self::FriendPostCreated),
            other => Err(format!("unknown notification type: {}", other)),
        }
    }
}

/// A stored notification row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: Uuid,
    pub actor_id: Uuid,
    #[sqlx(try_from = "String")]
    pub notification_type: NotificationType,
    pub entity_id: i64,
    pub entity_type: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Transport-safe projection sent to clients over REST and the live channel
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationDto {
    pub id: i64,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub actor_name: String,
    pub actor_profile_picture: Option<String>,
    pub entity_id: i64,
    pub entity_type: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// Envelope pushed on the per-user live channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiveMessage {
    Notification(NotificationDto),
    UnreadCount { count: i64 },
}

/// Paginated notification listing
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationPage {
    pub items: Vec<NotificationDto>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Notification not found")]
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_round_trips_through_string() {
        for t in [
            NotificationType::FriendRequestReceived,
            NotificationType::FriendRequestAccepted,
            NotificationType::FriendRequestDeclined,
            NotificationType::PostLiked,
            NotificationType::PostCommented,
            NotificationType::FriendPostCreated,
        ] {
            assert_eq!(
                NotificationType::try_from(t.as_str().to_string()).unwrap(),
                t
            );
        }
        assert!(NotificationType::try_from("SOMETHING_ELSE".to_string()).is_err());
    }

    #[test]
    fn default_messages_match_type_table() {
        assert_eq!(
            NotificationType::PostLiked.default_message(),
            "liked your post"
        );
        assert_eq!(
            NotificationType::FriendRequestReceived.default_message(),
            "sent you a friend request"
        );
    }

    #[test]
    fn live_message_envelope_is_kind_tagged() {
        let count = LiveMessage::UnreadCount { count: 3 };
        let json = serde_json::to_string(&count).unwrap();
        assert!(json.contains(r#""kind":"unread_count""#));
        assert!(json.contains(r#""count":3"#));

        let dto = NotificationDto {
            id: 7,
            notification_type: NotificationType::PostLiked,
            message: "Jane Doe liked your post".to_string(),
            actor_name: "Jane Doe".to_string(),
            actor_profile_picture: None,
            entity_id: 42,
            entity_type: "POST".to_string(),
            created_at: Utc::now(),
            is_read: false,
        };
        let json = serde_json::to_string(&LiveMessage::Notification(dto)).unwrap();
        assert!(json.contains(r#""kind":"notification""#));
        assert!(json.contains(r#""type":"POST_LIKED""#));
        assert!(json.contains(r#""entity_id":42"#));
    }
}
