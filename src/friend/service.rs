use sqlx::{Pool, Postgres, Row};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::friend::model::{
    FriendError, FriendResponse, Friendship, FriendshipStatus,
};
use crate::notification::service::NotificationService;

pub struct FriendService {
    pool: Pool<Postgres>,
    notification_service: Arc<NotificationService>,
}

impl FriendService {
    pub fn new(pool: Pool<Postgres>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    pub async fn send_request(&self, from: Uuid, to: Uuid) -> Result<Friendship, FriendError> {
        if from == to {
            return Err(FriendError::InvalidRequest(
                "Cannot send a friend request to yourself".to_string(),
            ));
        }
        if !self.user_exists(to).await? {
            return Err(FriendError::UserNotFound);
        }

        let existing = sqlx::query_as::<_, Friendship>(
            "SELECT * FROM social.friendships
             WHERE (requester_id = $1 AND addressee_id = $2)
                OR (requester_id = $2 AND addressee_id = $1)",
        )
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        let friendship = match existing {
            Some(f) if f.status != FriendshipStatus::Declined => {
                return Err(FriendError::AlreadyExists);
            }
            Some(f) => {
                // A declined request can be retried; reuse the row
                sqlx::query_as::<_, Friendship>(
                    "UPDATE social.friendships
                     SET requester_id = $1, addressee_id = $2, status = 'pending',
                         updated_at = NOW()
                     WHERE id = $3
                     RETURNING *",
                )
                .bind(from)
                .bind(to)
                .bind(f.id)
                .fetch_one(&self.pool)
                .await?
            }
            None => sqlx::query_as::<_, Friendship>(
                "INSERT INTO social.friendships (requester_id, addressee_id, status)
                 VALUES ($1, $2, 'pending')
                 RETURNING *",
            )
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    FriendError::AlreadyExists
                } else {
                    FriendError::DatabaseError(e)
                }
            })?,
        };

        let notifications = self.notification_service.clone();
        let request_id = friendship.id;
        tokio::spawn(async move {
            if let Err(e) = notifications
                .notify_friend_request_received(to, from, request_id)
                .await
            {
                warn!("Failed to send friend request notification: {:?}", e);
            }
        });

        Ok(friendship)
    }

    pub async fn accept(&self, request_id: i64, user_id: Uuid) -> Result<Friendship, FriendError> {
        self.resolve(request_id, user_id, FriendshipStatus::Accepted)
            .await
    }

    pub async fn decline(&self, request_id: i64, user_id: Uuid) -> Result<Friendship, FriendError> {
        self.resolve(request_id, user_id, FriendshipStatus::Declined)
            .await
    }

    /// Only the addressee of a pending request may accept or decline it.
    async fn resolve(
        &self,
        request_id: i64,
        user_id: Uuid,
        status: FriendshipStatus,
    ) -> Result<Friendship, FriendError> {
        let request = sqlx::query_as::<_, Friendship>(
            "SELECT * FROM social.friendships WHERE id = $1",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(FriendError::RequestNotFound)?;

        if request.addressee_id != user_id {
            return Err(FriendError::Unauthorized);
        }
        if request.status != FriendshipStatus::Pending {
            return Err(FriendError::InvalidRequest(
                "Friend request has already been resolved".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, Friendship>(
            "UPDATE social.friendships
             SET status = $1, updated_at = NOW()
             WHERE id = $2
             RETURNING *",
        )
        .bind(status.as_str())
        .bind(request_id)
        .fetch_one(&self.pool)
        .await?;

        let notifications = self.notification_service.clone();
        let requester = request.requester_id;
        tokio::spawn(async move {
            let result = match status {
                FriendshipStatus::Accepted => {
                    notifications
                        .notify_friend_request_accepted(requester, user_id, request_id)
                        .await
                }
                _ => {
                    notifications
                        .notify_friend_request_declined(requester, user_id, request_id)
                        .await
                }
            };
            if let Err(e) = result {
                warn!("Failed to send friend request update notification: {:?}", e);
            }
        });

        Ok(updated)
    }

    /// IDs of the user's accepted friends, from both directions of the pair.
    pub async fn friend_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, FriendError> {
        let rows = sqlx::query(
            "SELECT CASE WHEN requester_id = $1 THEN addressee_id ELSE requester_id END AS friend_id
             FROM social.friendships
             WHERE status = 'accepted' AND (requester_id = $1 OR addressee_id = $1)",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.get("friend_id")).collect())
    }

    pub async fn friends(&self, user_id: Uuid) -> Result<Vec<FriendResponse>, FriendError> {
        let rows = sqlx::query(
            "SELECT u.id, u.username AS name, u.profile_picture
             FROM social.friendships f
             JOIN social.users u
               ON u.id = CASE WHEN f.requester_id = $1 THEN f.addressee_id ELSE f.requester_id END
             WHERE f.status = 'accepted' AND (f.requester_id = $1 OR f.addressee_id = $1)
             ORDER BY u.username ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| FriendResponse {
                id: row.get("id"),
                name: row.get("name"),
                profile_picture: row.get("profile_picture"),
            })
            .collect())
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool, FriendError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM social.users WHERE id = $1) AS found")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("found"))
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(all(test, feature = "db-tests"))]
mod db_tests {
    use super::*;
    use crate::db::testutil;
    use crate::notification::service::NotificationService;
    use sqlx::PgPool;

    fn service(pool: &PgPool) -> FriendService {
        let notifications = Arc::new(NotificationService::new(pool.clone(), None));
        FriendService::new(pool.clone(), notifications)
    }

    #[sqlx::test]
    async fn reversed_pair_hits_the_unique_index(pool: PgPool) {
        testutil::setup(&pool).await;
        let a = testutil::create_user(&pool, "alice").await;
        let b = testutil::create_user(&pool, "bob").await;

        // Insert both directions directly, bypassing the service's
        // existing-row check, the way two racing requests would
        sqlx::query(
            "INSERT INTO social.friendships (requester_id, addressee_id, status)
             VALUES ($1, $2, 'pending')",
        )
        .bind(a)
        .bind(b)
        .execute(&pool)
        .await
        .unwrap();

        let reversed = sqlx::query(
            "INSERT INTO social.friendships (requester_id, addressee_id, status)
             VALUES ($1, $2, 'pending')",
        )
        .bind(b)
        .bind(a)
        .execute(&pool)
        .await;

        assert!(matches!(reversed, Err(ref e) if is_unique_violation(e)));
    }

    #[sqlx::test]
    async fn reversed_request_reports_already_exists(pool: PgPool) {
        testutil::setup(&pool).await;
        let a = testutil::create_user(&pool, "alice").await;
        let b = testutil::create_user(&pool, "bob").await;

        let service = service(&pool);

        service.send_request(a, b).await.unwrap();
        let reversed = service.send_request(b, a).await;
        assert!(matches!(reversed, Err(FriendError::AlreadyExists)));
    }
}
