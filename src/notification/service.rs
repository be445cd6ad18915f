use chrono::{Duration, Utc};
use redis::Client;
use sqlx::{PgPool, Row};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::notification::model::{
    LiveMessage, Notification, NotificationDto, NotificationError, NotificationPage,
    NotificationType,
};
use crate::websocket::notifications::publish_to_user;

#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    redis_client: Option<Client>,
}

impl NotificationService {
    pub fn new(pool: PgPool, redis_client: Option<Client>) -> Self {
        Self { pool, redis_client }
    }

    /// Create a notification unless the actor is the recipient or an
    /// identical one already exists. Returns the new row's ID, or None when
    /// the creation was suppressed.
    ///
    /// The live push happens on a spawned task after the insert returns, so
    /// a delivery failure can never roll back the persisted row.
    pub async fn create_notification(
        &self,
        recipient_id: Uuid,
        actor_id: Uuid,
        notification_type: NotificationType,
        entity_id: i64,
        entity_type: &str,
        custom_message: Option<String>,
    ) -> Result<Option<i64>, NotificationError> {
        // Users never get notified about their own actions
        if recipient_id == actor_id {
            return Ok(None);
        }

        let actor = sqlx::query(
            "SELECT username, first_name, last_name, profile_picture FROM social.users WHERE id = $1",
        )
        .bind(actor_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(NotificationError::NotFound)?;

        let actor_name = display_name(
            &actor.get::<String, _>("username"),
            &actor.get::<String, _>("first_name"),
            &actor.get::<String, _>("last_name"),
        );
        let actor_profile_picture: Option<String> = actor.get("profile_picture");

        let message = custom_message
            .unwrap_or_else(|| format!("{} {}", actor_name, notification_type.default_message()));

        // The unique index on (user, actor, type, entity) makes the
        // duplicate check and the insert one atomic statement.
        let inserted = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO social.notifications
                (user_id, actor_id, notification_type, entity_id, entity_type, message, is_read)
            VALUES ($1, $2, $3, $4, $5, $6, false)
            ON CONFLICT (user_id, actor_id, notification_type, entity_id, entity_type) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(recipient_id)
        .bind(actor_id)
        .bind(notification_type.as_str())
        .bind(entity_id)
        .bind(entity_type)
        .bind(&message)
        .fetch_optional(&self.pool)
        .await?;

        let notification = match inserted {
            Some(n) => n,
            None => {
                debug!(
                    "Notification already exists for user {} from actor {} for entity {}",
                    recipient_id, actor_id, entity_id
                );
                return Ok(None);
            }
        };

        info!(
            "Created notification {} for user {}",
            notification.id, recipient_id
        );

        // Best-effort push after the row is committed
        if let Some(client) = self.redis_client.clone() {
            let dto = NotificationDto {
                id: notification.id,
                notification_type,
                message,
                actor_name,
                actor_profile_picture,
                entity_id,
                entity_type: entity_type.to_string(),
                created_at: notification.created_at,
                is_read: false,
            };
            let service = self.clone();
            tokio::spawn(async move {
                if let Err(e) =
                    publish_to_user(&client, &recipient_id, &LiveMessage::Notification(dto)).await
                {
                    error!("Failed to push notification via live channel: {}", e);
                }
                service.push_unread_count(&client, recipient_id).await;
            });
        }

        Ok(Some(notification.id))
    }

    async fn push_unread_count(&self, client: &Client, user_id: Uuid) {
        match self.unread_count(user_id).await {
            Ok(count) => {
                if let Err(e) =
                    publish_to_user(client, &user_id, &LiveMessage::UnreadCount { count }).await
                {
                    error!("Failed to push unread count: {}", e);
                }
            }
            Err(e) => error!("Failed to compute unread count: {}", e),
        }
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, NotificationError> {
        let count: i64 = sqlx::query(
            "SELECT COUNT(*) FROM social.notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?
        .get(0);

        Ok(count)
    }

    pub async fn unread(&self, user_id: Uuid) -> Result<Vec<NotificationDto>, NotificationError> {
        let rows = sqlx::query(&format!(
            "{} WHERE n.user_id = $1 AND n.is_read = false ORDER BY n.created_at DESC",
            DTO_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_dto).collect()
    }

    /// Paginated notifications for a user, newest first
    pub async fn list(
        &self,
        user_id: Uuid,
        page: i64,
        size: i64,
    ) -> Result<NotificationPage, NotificationError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) FROM social.notifications WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?
            .get(0);

        let rows = sqlx::query(&format!(
            "{} WHERE n.user_id = $1 ORDER BY n.created_at DESC LIMIT $2 OFFSET $3",
            DTO_SELECT
        ))
        .bind(user_id)
        .bind(size)
        .bind(page * size)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(row_to_dto)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NotificationPage {
            items,
            total,
            page,
            size,
        })
    }

    /// Flip the read flag, only when the notification belongs to the caller
    pub async fn mark_as_read(
        &self,
        notification_id: i64,
        user_id: Uuid,
    ) -> Result<bool, NotificationError> {
        let updated = sqlx::query(
            "UPDATE social.notifications SET is_read = true WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated > 0 {
            if let Some(client) = self.redis_client.clone() {
                let service = self.clone();
                tokio::spawn(async move {
                    service.push_unread_count(&client, user_id).await;
                });
            }
        }

        Ok(updated > 0)
    }

    /// Mark every unread notification for a user as read
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, NotificationError> {
        let updated = sqlx::query(
            "UPDATE social.notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated > 0 {
            if let Some(client) = self.redis_client.clone() {
                tokio::spawn(async move {
                    if let Err(e) =
                        publish_to_user(&client, &user_id, &LiveMessage::UnreadCount { count: 0 })
                            .await
                    {
                        error!("Failed to push unread count: {}", e);
                    }
                });
            }
        }

        Ok(updated)
    }

    /// Delete read notifications older than the retention window
    pub async fn cleanup(&self, retention_days: i64) -> Result<u64, NotificationError> {
        let cutoff = Utc::now() - Duration::days(retention_days);

        let deleted = sqlx::query(
            "DELETE FROM social.notifications WHERE is_read = true AND created_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        info!("Cleaned up {} old notifications", deleted);
        Ok(deleted)
    }

    /// Remove notifications referencing an entity that no longer exists
    pub async fn delete_for_entity(
        &self,
        notification_type: NotificationType,
        entity_id: i64,
        entity_type: &str,
    ) -> Result<u64, NotificationError> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM social.notifications
            WHERE notification_type = $1 AND entity_id = $2 AND entity_type = $3
            "#,
        )
        .bind(notification_type.as_str())
        .bind(entity_id)
        .bind(entity_type)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted > 0 {
            info!(
                "Deleted {} notifications for entity {} of type {:?}",
                deleted, entity_id, notification_type
            );
        }
        Ok(deleted)
    }

    // Convenience wrappers for the triggering events

    pub async fn notify_friend_request_received(
        &self,
        receiver_id: Uuid,
        sender_id: Uuid,
        request_id: i64,
    ) -> Result<(), NotificationError> {
        self.create_notification(
            receiver_id,
            sender_id,
            NotificationType::FriendRequestReceived,
            request_id,
            "FRIEND_REQUEST",
            None,
        )
        .await
        .map(|_| ())
    }

    pub async fn notify_friend_request_accepted(
        &self,
        requester_id: Uuid,
        accepter_id: Uuid,
        request_id: i64,
    ) -> Result<(), NotificationError> {
        self.create_notification(
            requester_id,
            accepter_id,
            NotificationType::FriendRequestAccepted,
            request_id,
            "FRIEND_REQUEST",
            None,
        )
        .await
        .map(|_| ())
    }

    pub async fn notify_friend_request_declined(
        &self,
        requester_id: Uuid,
        decliner_id: Uuid,
        request_id: i64,
    ) -> Result<(), NotificationError> {
        self.create_notification(
            requester_id,
            decliner_id,
            NotificationType::FriendRequestDeclined,
            request_id,
            "FRIEND_REQUEST",
            None,
        )
        .await
        .map(|_| ())
    }

    pub async fn notify_post_liked(
        &self,
        post_owner_id: Uuid,
        liker_id: Uuid,
        post_id: i64,
    ) -> Result<(), NotificationError> {
        self.create_notification(
            post_owner_id,
            liker_id,
            NotificationType::PostLiked,
            post_id,
            "POST",
            None,
        )
        .await
        .map(|_| ())
    }

    pub async fn notify_post_commented(
        &self,
        post_owner_id: Uuid,
        commenter_id: Uuid,
        comment_id: i64,
    ) -> Result<(), NotificationError> {
        self.create_notification(
            post_owner_id,
            commenter_id,
            NotificationType::PostCommented,
            comment_id,
            "COMMENT",
            None,
        )
        .await
        .map(|_| ())
    }

    /// Fan out a new-post notification to each friend individually
    pub async fn notify_friend_post_created(
        &self,
        friend_ids: &[Uuid],
        creator_id: Uuid,
        post_id: i64,
    ) -> Result<(), NotificationError> {
        for friend_id in friend_ids {
            self.create_notification(
                *friend_id,
                creator_id,
                NotificationType::FriendPostCreated,
                post_id,
                "POST",
                None,
            )
            .await?;
        }
        Ok(())
    }
}

const DTO_SELECT: &str = r#"
    SELECT n.id, n.notification_type, n.message, n.entity_id, n.entity_type,
           n.is_read, n.created_at, u.username, u.first_name, u.last_name, u.profile_picture
    FROM social.notifications n
    JOIN social.users u ON u.id = n.actor_id
"#;

fn row_to_dto(row: sqlx::postgres::PgRow) -> Result<NotificationDto, NotificationError> {
    let type_str: String = row.get("notification_type");
    let notification_type = NotificationType::try_from(type_str)
        .map_err(|e| NotificationError::DatabaseError(sqlx::Error::Decode(e.into())))?;

    Ok(NotificationDto {
        id: row.get("id"),
        notification_type,
        message: row.get("message"),
        actor_name: display_name(
            &row.get::<String, _>("username"),
            &row.get::<String, _>("first_name"),
            &row.get::<String, _>("last_name"),
        ),
        actor_profile_picture: row.get("profile_picture"),
        entity_id: row.get("entity_id"),
        entity_type: row.get("entity_type"),
        created_at: row.get("created_at"),
        is_read: row.get("is_read"),
    })
}

fn display_name(username: &str, first_name: &str, last_name: &str) -> String {
    let full = format!("{} {}", first_name, last_name);
    let full = full.trim();
    if full.is_empty() {
        username.to_string()
    } else {
        full.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_full_name() {
        assert_eq!(display_name("jdoe", "Jane", "Doe"), "Jane Doe");
        assert_eq!(display_name("jdoe", "Jane", ""), "Jane");
        assert_eq!(display_name("jdoe", "", ""), "jdoe");
    }
}

#[cfg(all(test, feature = "db-tests"))]
mod db_tests {
    use super::*;
    use crate::db::testutil;

    #[sqlx::test]
    async fn identical_notification_is_created_once(pool: PgPool) {
        testutil::setup(&pool).await;
        let recipient = testutil::create_user(&pool, "recipient").await;
        let actor = testutil::create_user(&pool, "actor").await;

        let service = NotificationService::new(pool.clone(), None);

        let first = service
            .create_notification(recipient, actor, NotificationType::PostLiked, 7, "POST", None)
            .await
            .unwrap();
        assert!(first.is_some());

        let second = service
            .create_notification(recipient, actor, NotificationType::PostLiked, 7, "POST", None)
            .await
            .unwrap();
        assert!(second.is_none());

        let rows = testutil::count(
            &pool,
            "SELECT COUNT(*) FROM social.notifications WHERE entity_id = $1",
            7,
        )
        .await;
        assert_eq!(rows, 1);
    }

    #[sqlx::test]
    async fn own_actions_never_notify(pool: PgPool) {
        testutil::setup(&pool).await;
        let user = testutil::create_user(&pool, "loner").await;

        let service = NotificationService::new(pool.clone(), None);

        let created = service
            .create_notification(user, user, NotificationType::PostLiked, 7, "POST", None)
            .await
            .unwrap();
        assert!(created.is_none());
        assert_eq!(service.unread_count(user).await.unwrap(), 0);
    }

    #[sqlx::test]
    async fn mark_read_only_works_for_the_owner(pool: PgPool) {
        testutil::setup(&pool).await;
        let recipient = testutil::create_user(&pool, "recipient").await;
        let actor = testutil::create_user(&pool, "actor").await;

        let service = NotificationService::new(pool.clone(), None);
        let id = service
            .create_notification(recipient, actor, NotificationType::PostLiked, 7, "POST", None)
            .await
            .unwrap()
            .unwrap();

        assert!(!service.mark_as_read(id, actor).await.unwrap());
        assert_eq!(service.unread_count(recipient).await.unwrap(), 1);

        assert!(service.mark_as_read(id, recipient).await.unwrap());
        assert_eq!(service.unread_count(recipient).await.unwrap(), 0);
    }
}
