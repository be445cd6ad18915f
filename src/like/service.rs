use sqlx::{Pool, Postgres, Row};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::like::model::{Like, LikeError};
use crate::notification::service::NotificationService;

pub struct LikeService {
    pool: Pool<Postgres>,
    notification_service: Arc<NotificationService>,
}

impl LikeService {
    pub fn new(pool: Pool<Postgres>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    /// Records a like. Liking an already-liked post is a no-op and the
    /// current count is returned either way.
    pub async fn like_post(&self, post_id: i64, user_id: Uuid) -> Result<i64, LikeError> {
        let owner = self.post_owner(post_id).await?;

        let mut tx = self.pool.begin().await?;

        let like = sqlx::query_as::<_, Like>(
            "INSERT INTO social.likes (post_id, user_id)
             VALUES ($1, $2)
             ON CONFLICT (post_id, user_id) DO NOTHING
             RETURNING *",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let inserted = like.is_some();

        if inserted {
            sqlx::query(
                "UPDATE social.posts SET like_count = like_count + 1, updated_at = NOW()
                 WHERE id = $1",
            )
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        if inserted {
            let notifications = self.notification_service.clone();
            tokio::spawn(async move {
                if let Err(e) = notifications.notify_post_liked(owner, user_id, post_id).await {
                    warn!("Failed to send like notification: {:?}", e);
                }
            });
        } else {
            debug!("User {} already liked post {}", user_id, post_id);
        }

        self.like_count(post_id).await
    }

    pub async fn unlike_post(&self, post_id: i64, user_id: Uuid) -> Result<i64, LikeError> {
        self.post_owner(post_id).await?;

        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM social.likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if removed {
            sqlx::query(
                "UPDATE social.posts
                 SET like_count = GREATEST(like_count - 1, 0), updated_at = NOW()
                 WHERE id = $1",
            )
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.like_count(post_id).await
    }

    pub async fn is_liked(&self, post_id: i64, user_id: Uuid) -> Result<bool, LikeError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM social.likes WHERE post_id = $1 AND user_id = $2) AS liked",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("liked"))
    }

    pub async fn like_count(&self, post_id: i64) -> Result<i64, LikeError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM social.likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    async fn post_owner(&self, post_id: i64) -> Result<Uuid, LikeError> {
        let row = sqlx::query("SELECT user_id FROM social.posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(row.get("user_id")),
            None => Err(LikeError::PostNotFound),
        }
    }
}

#[cfg(all(test, feature = "db-tests"))]
mod db_tests {
    use super::*;
    use crate::db::testutil;
    use sqlx::PgPool;

    fn service(pool: &PgPool) -> LikeService {
        let notifications = Arc::new(crate::notification::service::NotificationService::new(
            pool.clone(),
            None,
        ));
        LikeService::new(pool.clone(), notifications)
    }

    #[sqlx::test]
    async fn repeated_unlikes_never_drive_the_count_negative(pool: PgPool) {
        testutil::setup(&pool).await;
        let author = testutil::create_user(&pool, "author").await;
        let liker = testutil::create_user(&pool, "liker").await;
        let post_id = testutil::create_post(&pool, author, "hello").await;

        let service = service(&pool);

        // Unliking a never-liked post is a no-op
        assert_eq!(service.unlike_post(post_id, liker).await.unwrap(), 0);

        assert_eq!(service.like_post(post_id, liker).await.unwrap(), 1);
        assert_eq!(service.unlike_post(post_id, liker).await.unwrap(), 0);
        assert_eq!(service.unlike_post(post_id, liker).await.unwrap(), 0);

        let column: i64 = testutil::count(
            &pool,
            "SELECT like_count FROM social.posts WHERE id = $1",
            post_id,
        )
        .await;
        assert_eq!(column, 0);
    }

    #[sqlx::test]
    async fn liking_twice_counts_once(pool: PgPool) {
        testutil::setup(&pool).await;
        let author = testutil::create_user(&pool, "author").await;
        let liker = testutil::create_user(&pool, "liker").await;
        let post_id = testutil::create_post(&pool, author, "hello").await;

        let service = service(&pool);

        assert_eq!(service.like_post(post_id, liker).await.unwrap(), 1);
        assert_eq!(service.like_post(post_id, liker).await.unwrap(), 1);
        assert!(service.is_liked(post_id, liker).await.unwrap());
    }
}
