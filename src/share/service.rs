use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::post::model::MAX_CONTENT_LENGTH;
use crate::share::model::{Share, ShareError};

pub struct ShareService {
    pool: PgPool,
}

impl ShareService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Share a post: create the linked shared-post row, the share record,
    /// and bump the original's counter, all in one transaction.
    ///
    /// Only original posts can be shared; a shared copy is rejected rather
    /// than building chains of copies whose originals can disappear.
    ///
    /// The unique constraint on (original_post_id, user_id) backstops the
    /// in-transaction check under concurrent requests; either path reports
    /// `AlreadyShared` and leaves no partial state behind.
    pub async fn share_post(
        &self,
        post_id: i64,
        user_id: Uuid,
        share_text: Option<&str>,
    ) -> Result<i64, ShareError> {
        if let Some(text) = share_text {
            if text.chars().count() > MAX_CONTENT_LENGTH {
                return Err(ShareError::InvalidInput(
                    "Share text is too long. Please keep it under 280 characters.".to_string(),
                ));
            }
        }

        let mut tx = self.pool.begin().await?;

        let is_shared_copy: Option<bool> =
            sqlx::query("SELECT is_shared_post FROM social.posts WHERE id = $1")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?
                .map(|row| row.get(0));
        match is_shared_copy {
            None => return Err(ShareError::PostNotFound),
            Some(true) => return Err(ShareError::SharedCopy),
            Some(false) => {}
        }

        let already: bool = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM social.shares WHERE original_post_id = $1 AND user_id = $2)",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?
        .get(0);
        if already {
            return Err(ShareError::AlreadyShared);
        }

        let shared_post_id: i64 = sqlx::query(
            r#"
            INSERT INTO social.posts (content, user_id, shared_post_id, is_shared_post)
            VALUES ($1, $2, $3, true)
            RETURNING id
            "#,
        )
        .bind(share_text.unwrap_or_default())
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?
        .get(0);

        let share = sqlx::query_as::<_, Share>(
            r#"
            INSERT INTO social.shares (original_post_id, shared_post_id, user_id, share_text)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(post_id)
        .bind(shared_post_id)
        .bind(user_id)
        .bind(share_text)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ShareError::AlreadyShared
            } else {
                ShareError::DatabaseError(e)
            }
        })?;

        sqlx::query(
            "UPDATE social.posts SET share_count = share_count + 1, updated_at = now() WHERE id = $1",
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Share {} created: user {} shared post {} as post {}",
            share.id, user_id, post_id, shared_post_id
        );
        Ok(shared_post_id)
    }

    /// Remove a share and its shared-post row; false when nothing existed
    pub async fn unshare_post(&self, post_id: i64, user_id: Uuid) -> Result<bool, ShareError> {
        let mut tx = self.pool.begin().await?;

        let shared_post_id: Option<i64> = sqlx::query(
            r#"
            DELETE FROM social.shares
            WHERE original_post_id = $1 AND user_id = $2
            RETURNING shared_post_id
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| row.get(0));

        let shared_post_id = match shared_post_id {
            Some(id) => id,
            None => return Ok(false),
        };

        sqlx::query("DELETE FROM social.posts WHERE id = $1")
            .bind(shared_post_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE social.posts SET share_count = GREATEST(share_count - 1, 0), updated_at = now() WHERE id = $1",
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("User {} unshared post {}", user_id, post_id);
        Ok(true)
    }

    pub async fn is_shared(&self, post_id: i64, user_id: Uuid) -> Result<bool, ShareError> {
        let shared: bool = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM social.shares WHERE original_post_id = $1 AND user_id = $2)",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?
        .get(0);

        Ok(shared)
    }

    /// Recomputed from the shares table, never from the denormalized column
    pub async fn share_count(&self, post_id: i64) -> Result<i64, ShareError> {
        let count: i64 =
            sqlx::query("SELECT COUNT(*) FROM social.shares WHERE original_post_id = $1")
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?
                .get(0);

        Ok(count)
    }

    pub async fn post_exists(&self, post_id: i64) -> Result<bool, ShareError> {
        let exists: bool = sqlx::query("SELECT EXISTS(SELECT 1 FROM social.posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?
            .get(0);

        Ok(exists)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overlong_share_text_is_rejected_before_any_query() {
        // connect_lazy never opens a connection; the length check has to
        // fire before the first query for this to pass
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let service = ShareService::new(pool);

        let text = "x".repeat(281);
        let result = service
            .share_post(1, Uuid::new_v4(), Some(text.as_str()))
            .await;

        assert!(matches!(result, Err(ShareError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn share_text_at_the_limit_passes_validation() {
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let service = ShareService::new(pool);

        let text = "x".repeat(280);
        let result = service
            .share_post(1, Uuid::new_v4(), Some(text.as_str()))
            .await;

        // Validation passes; the lazy pool then fails on first use
        assert!(matches!(result, Err(ShareError::DatabaseError(_))));
    }
}

#[cfg(all(test, feature = "db-tests"))]
mod db_tests {
    use super::*;
    use crate::db::testutil;

    #[sqlx::test]
    async fn duplicate_share_leaves_a_single_row(pool: PgPool) {
        testutil::setup(&pool).await;
        let author = testutil::create_user(&pool, "author").await;
        let sharer = testutil::create_user(&pool, "sharer").await;
        let post_id = testutil::create_post(&pool, author, "hello").await;

        let service = ShareService::new(pool.clone());

        service.share_post(post_id, sharer, None).await.unwrap();
        let second = service.share_post(post_id, sharer, None).await;
        assert!(matches!(second, Err(ShareError::AlreadyShared)));

        let rows = testutil::count(
            &pool,
            "SELECT COUNT(*) FROM social.shares WHERE original_post_id = $1",
            post_id,
        )
        .await;
        assert_eq!(rows, 1);
        assert_eq!(service.share_count(post_id).await.unwrap(), 1);
    }

    #[sqlx::test]
    async fn sharing_a_shared_copy_is_rejected(pool: PgPool) {
        testutil::setup(&pool).await;
        let author = testutil::create_user(&pool, "author").await;
        let sharer = testutil::create_user(&pool, "sharer").await;
        let other = testutil::create_user(&pool, "other").await;
        let post_id = testutil::create_post(&pool, author, "hello").await;

        let service = ShareService::new(pool.clone());
        let copy_id = service.share_post(post_id, sharer, None).await.unwrap();

        let result = service.share_post(copy_id, other, None).await;
        assert!(matches!(result, Err(ShareError::SharedCopy)));
    }
}
