use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::comment::model::{Comment, CommentAuthor, CommentError, CommentResponse};
use crate::notification::model::NotificationType;
use crate::notification::service::NotificationService;
use crate::util::time::verbose_time_ago;

pub struct CommentService {
    pool: Pool<Postgres>,
    notification_service: Arc<NotificationService>,
}

impl CommentService {
    pub fn new(pool: Pool<Postgres>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    pub async fn create_comment(
        &self,
        post_id: i64,
        user_id: Uuid,
        content: &str,
    ) -> Result<CommentResponse, CommentError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CommentError::InvalidInput(
                "Comment content cannot be empty".to_string(),
            ));
        }

        let owner = self.post_owner(post_id).await?;

        let mut tx = self.pool.begin().await?;

        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO social.comments (post_id, user_id, content)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE social.posts SET comment_count = comment_count + 1, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let notifications = self.notification_service.clone();
        let comment_id = comment.id;
        tokio::spawn(async move {
            if let Err(e) = notifications
                .notify_post_commented(owner, user_id, comment_id)
                .await
            {
                warn!("Failed to send comment notification: {:?}", e);
            }
        });

        let author = self.author_of(user_id).await?;
        Ok(to_response(comment, author))
    }

    /// Comments for a post, oldest first.
    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentResponse>, CommentError> {
        self.post_owner(post_id).await?;

        let rows = sqlx::query(
            "SELECT c.id, c.content, c.created_at,
                    u.id AS author_id, u.username AS author_name, u.profile_picture
             FROM social.comments c
             JOIN social.users u ON u.id = c.user_id
             WHERE c.post_id = $1
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let created_at: DateTime<Utc> = row.get("created_at");
                CommentResponse {
                    id: row.get("id"),
                    content: row.get("content"),
                    author: CommentAuthor {
                        id: row.get("author_id"),
                        name: row.get("author_name"),
                        profile_picture: row.get("profile_picture"),
                    },
                    time_ago: verbose_time_ago(created_at),
                    created_at,
                }
            })
            .collect())
    }

    /// Deletes a comment. Only its author may remove it.
    pub async fn delete_comment(&self, comment_id: i64, user_id: Uuid) -> Result<(), CommentError> {
        let row = sqlx::query("SELECT post_id, user_id FROM social.comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CommentError::NotFound)?;

        let author: Uuid = row.get("user_id");
        if author != user_id {
            return Err(CommentError::Unauthorized);
        }
        let post_id: i64 = row.get("post_id");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM social.comments WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE social.posts
             SET comment_count = GREATEST(comment_count - 1, 0), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let notifications = self.notification_service.clone();
        tokio::spawn(async move {
            if let Err(e) = notifications
                .delete_for_entity(NotificationType::PostCommented, comment_id, "COMMENT")
                .await
            {
                warn!(
                    "Failed to clear notifications for deleted comment: {:?}",
                    e
                );
            }
        });

        Ok(())
    }

    async fn post_owner(&self, post_id: i64) -> Result<Uuid, CommentError> {
        let row = sqlx::query("SELECT user_id FROM social.posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(row.get("user_id")),
            None => Err(CommentError::PostNotFound),
        }
    }

    async fn author_of(&self, user_id: Uuid) -> Result<CommentAuthor, CommentError> {
        let row = sqlx::query(
            "SELECT id, username AS name, profile_picture FROM social.users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(CommentAuthor {
            id: row.get("id"),
            name: row.get("name"),
            profile_picture: row.get("profile_picture"),
        })
    }
}

fn to_response(comment: Comment, author: CommentAuthor) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        content: comment.content,
        author,
        time_ago: verbose_time_ago(comment.created_at),
        created_at: comment.created_at,
    }
}
