use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::friend::service::FriendService;
use crate::notification::model::NotificationType;
use crate::notification::service::NotificationService;
use crate::post::model::{
    Location, MediaResponse, Post, PostError, PostMedia, PostResponse, UserBrief,
    MAX_CONTENT_LENGTH,
};
use crate::upload::service::{FileStore, UploadedFile};
use crate::util::time::time_ago;

// Subdirectory of the upload root for post attachments
const POST_MEDIA_DIR: &str = "posts";

// Counts are recomputed from child rows on every read; the denormalized
// columns on posts are only a fast path for writers.
const POST_SELECT: &str = r#"
    SELECT p.id, p.content, p.user_id, p.shared_post_id, p.is_shared_post,
           p.location_name, p.location_latitude, p.location_longitude, p.location_type,
           (SELECT COUNT(*) FROM social.likes l WHERE l.post_id = p.id) AS like_count,
           (SELECT COUNT(*) FROM social.comments c WHERE c.post_id = p.id) AS comment_count,
           (SELECT COUNT(*) FROM social.shares s WHERE s.original_post_id = p.id) AS share_count,
           p.created_at, p.updated_at
    FROM social.posts p
"#;

pub struct PostService {
    pool: PgPool,
    file_store: FileStore,
    friend_service: Arc<FriendService>,
    notification_service: Arc<NotificationService>,
}

impl PostService {
    pub fn new(
        pool: PgPool,
        file_store: FileStore,
        friend_service: Arc<FriendService>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            pool,
            file_store,
            friend_service,
            notification_service,
        }
    }

    /// Create a post with optional location and media attachments.
    ///
    /// Media files are validated before anything is written; a failure while
    /// persisting them rolls the post back and removes any stored files.
    /// Friends are notified after the transaction commits.
    pub async fn create_post(
        &self,
        user_id: Uuid,
        content: &str,
        location: Option<Location>,
        media: Vec<UploadedFile>,
    ) -> Result<PostResponse, PostError> {
        let content = content.trim();

        if content.is_empty() && media.is_empty() {
            return Err(PostError::InvalidInput(
                "Post cannot be empty. Please add some content or attach media.".to_string(),
            ));
        }

        if content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(PostError::InvalidInput(
                "Post content is too long. Please keep it under 280 characters.".to_string(),
            ));
        }

        // Reject the whole post before any file or row is written
        for file in &media {
            if file.data.is_empty() {
                return Err(PostError::InvalidInput(
                    "Cannot attach an empty file".to_string(),
                ));
            }
            if !self.file_store.is_valid_type(&file.mime_type) {
                return Err(PostError::InvalidInput(format!(
                    "File type not allowed: {}",
                    file.mime_type
                )));
            }
        }

        let mut tx = self.pool.begin().await?;

        let post_id: i64 = sqlx::query(
            r#"
            INSERT INTO social.posts
                (content, user_id, location_name, location_latitude, location_longitude, location_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(content)
        .bind(user_id)
        .bind(location.as_ref().map(|l| l.name.clone()))
        .bind(location.as_ref().map(|l| l.lat))
        .bind(location.as_ref().map(|l| l.lng))
        .bind(location.as_ref().map(|l| l.location_type.clone()))
        .fetch_one(&mut *tx)
        .await?
        .get(0);

        // Any failure from here through the commit rolls the post back, so
        // the files written so far must come off the disk too.
        let mut stored_paths: Vec<String> = Vec::new();
        let persisted = match self
            .store_media(&mut tx, post_id, &media, &mut stored_paths)
            .await
        {
            Ok(()) => tx.commit().await.map_err(PostError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = persisted {
            for path in &stored_paths {
                self.file_store.delete(path).await;
            }
            return Err(e);
        }

        info!("Created post with ID: {}", post_id);

        // Fan out to friends after the commit, off the request path
        match self.friend_service.friend_ids(user_id).await {
            Ok(friend_ids) if !friend_ids.is_empty() => {
                let notification_service = self.notification_service.clone();
                tokio::spawn(async move {
                    if let Err(e) = notification_service
                        .notify_friend_post_created(&friend_ids, user_id, post_id)
                        .await
                    {
                        error!("Failed to notify friends of new post: {:?}", e);
                    }
                });
            }
            Ok(_) => {}
            Err(e) => error!("Failed to list friends for post fan-out: {:?}", e),
        }

        self.get_post(post_id).await
    }

    /// Save each media file and record its row, tracking every path written
    /// so the caller can clean up on failure.
    async fn store_media(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        post_id: i64,
        media: &[UploadedFile],
        stored_paths: &mut Vec<String>,
    ) -> Result<(), PostError> {
        for (order, file) in media.iter().enumerate() {
            let stored = self.file_store.save(file, POST_MEDIA_DIR).await?;
            stored_paths.push(stored.public_path.clone());

            sqlx::query(
                r#"
                INSERT INTO social.post_media
                    (post_id, file_name, file_path, file_type, mime_type, file_size, upload_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(post_id)
            .bind(&file.file_name)
            .bind(&stored.public_path)
            .bind(stored.category.as_str())
            .bind(&file.mime_type)
            .bind(file.data.len() as i64)
            .bind(order as i32)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    /// Get a single post with author, media and recomputed counts
    pub async fn get_post(&self, id: i64) -> Result<PostResponse, PostError> {
        let post = sqlx::query_as::<_, Post>(&format!("{} WHERE p.id = $1", POST_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PostError::NotFound)?;

        self.to_response(post).await
    }

    /// Feed: the user's own posts and their accepted friends' posts
    pub async fn feed(&self, user_id: Uuid) -> Result<Vec<PostResponse>, PostError> {
        let mut author_ids = self
            .friend_service
            .friend_ids(user_id)
            .await
            .map_err(|e| PostError::InternalError(e.to_string()))?;
        author_ids.push(user_id);

        let posts = sqlx::query_as::<_, Post>(&format!(
            "{} WHERE p.user_id = ANY($1) ORDER BY p.created_at DESC",
            POST_SELECT
        ))
        .bind(&author_ids)
        .fetch_all(&self.pool)
        .await?;

        self.to_responses(posts).await
    }

    /// Search within the user's feed by content substring
    pub async fn search_feed(
        &self,
        user_id: Uuid,
        term: &str,
    ) -> Result<Vec<PostResponse>, PostError> {
        let mut author_ids = self
            .friend_service
            .friend_ids(user_id)
            .await
            .map_err(|e| PostError::InternalError(e.to_string()))?;
        author_ids.push(user_id);

        let posts = sqlx::query_as::<_, Post>(&format!(
            "{} WHERE p.user_id = ANY($1) AND p.content ILIKE $2 ORDER BY p.created_at DESC",
            POST_SELECT
        ))
        .bind(&author_ids)
        .bind(format!("%{}%", term))
        .fetch_all(&self.pool)
        .await?;

        self.to_responses(posts).await
    }

    /// Search across every post
    pub async fn search_all(&self, term: &str) -> Result<Vec<PostResponse>, PostError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "{} WHERE p.content ILIKE $1 ORDER BY p.created_at DESC",
            POST_SELECT
        ))
        .bind(format!("%{}%", term))
        .fetch_all(&self.pool)
        .await?;

        self.to_responses(posts).await
    }

    /// Delete a post and everything hanging off it.
    ///
    /// Child rows (media, likes, comments, shares and their shared posts)
    /// are removed explicitly in one transaction; stored media files are
    /// unlinked afterwards, tolerating misses.
    pub async fn delete_post(&self, id: i64, user_id: Uuid) -> Result<(), PostError> {
        let owner: Uuid = sqlx::query("SELECT user_id FROM social.posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PostError::NotFound)?
            .get("user_id");

        if owner != user_id {
            return Err(PostError::Unauthorized);
        }

        let media = sqlx::query_as::<_, PostMedia>(
            "SELECT * FROM social.post_media WHERE post_id = $1 ORDER BY upload_order ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut tx = self.pool.begin().await?;

        // Shared copies of this post go away with it
        let shared_copy_ids: Vec<i64> =
            sqlx::query("SELECT shared_post_id FROM social.shares WHERE original_post_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .map(|row| row.get::<i64, _>(0))
                .collect();

        sqlx::query("DELETE FROM social.shares WHERE original_post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for copy_id in &shared_copy_ids {
            sqlx::query("DELETE FROM social.posts WHERE id = $1")
                .bind(copy_id)
                .execute(&mut *tx)
                .await?;
        }

        // If this post is itself a shared copy, retire its share record and
        // give the original its count back
        let original: Option<i64> =
            sqlx::query("DELETE FROM social.shares WHERE shared_post_id = $1 RETURNING original_post_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .map(|row| row.get(0));

        if let Some(original_id) = original {
            sqlx::query(
                "UPDATE social.posts SET share_count = GREATEST(share_count - 1, 0) WHERE id = $1",
            )
            .bind(original_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM social.post_media WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM social.likes WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted_comment_ids: Vec<i64> =
            sqlx::query("DELETE FROM social.comments WHERE post_id = $1 RETURNING id")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .map(|row| row.get(0))
                .collect();
        sqlx::query("DELETE FROM social.posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        for item in &media {
            self.file_store.delete(&item.file_path).await;
        }

        // Notifications pointing at the deleted post or its comments are
        // stale now
        let notification_service = self.notification_service.clone();
        tokio::spawn(async move {
            for notification_type in [NotificationType::PostLiked, NotificationType::FriendPostCreated] {
                if let Err(e) = notification_service
                    .delete_for_entity(notification_type, id, "POST")
                    .await
                {
                    error!("Failed to clear notifications for deleted post: {:?}", e);
                }
            }
            for comment_id in deleted_comment_ids {
                if let Err(e) = notification_service
                    .delete_for_entity(NotificationType::PostCommented, comment_id, "COMMENT")
                    .await
                {
                    error!("Failed to clear notifications for deleted comment: {:?}", e);
                }
            }
        });

        info!("Deleted post {} and {} media files", id, media.len());
        Ok(())
    }

    async fn to_responses(&self, posts: Vec<Post>) -> Result<Vec<PostResponse>, PostError> {
        let mut responses = Vec::with_capacity(posts.len());
        for post in posts {
            responses.push(self.to_response(post).await?);
        }
        Ok(responses)
    }

    async fn to_response(&self, post: Post) -> Result<PostResponse, PostError> {
        let author = sqlx::query_as::<_, UserBrief>(
            "SELECT id, username AS name, profile_picture FROM social.users WHERE id = $1",
        )
        .bind(post.user_id)
        .fetch_one(&self.pool)
        .await?;

        let media = sqlx::query_as::<_, PostMedia>(
            "SELECT * FROM social.post_media WHERE post_id = $1 ORDER BY upload_order ASC",
        )
        .bind(post.id)
        .fetch_all(&self.pool)
        .await?;

        let location = match (
            post.location_name,
            post.location_latitude,
            post.location_longitude,
        ) {
            (Some(name), Some(lat), Some(lng)) => Some(Location {
                name,
                lat,
                lng,
                location_type: post.location_type.unwrap_or_else(|| "custom".to_string()),
            }),
            _ => None,
        };

        Ok(PostResponse {
            id: post.id,
            content: post.content,
            author,
            is_shared_post: post.is_shared_post,
            shared_post_id: post.shared_post_id,
            media: media
                .into_iter()
                .map(|m| MediaResponse {
                    id: m.id,
                    file_name: m.file_name,
                    file_path: m.file_path,
                    file_type: m.file_type,
                    mime_type: m.mime_type,
                    file_size: m.file_size,
                    upload_order: m.upload_order,
                })
                .collect(),
            location,
            like_count: post.like_count,
            comment_count: post.comment_count,
            share_count: post.share_count,
            time_ago: time_ago(post.created_at),
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }
}

#[cfg(all(test, feature = "db-tests"))]
mod db_tests {
    use super::*;
    use crate::db::testutil;
    use std::time::Duration;

    fn temp_store() -> FileStore {
        let dir = std::env::temp_dir().join(format!("post-media-test-{}", Uuid::new_v4()));
        FileStore::new(dir)
    }

    fn service(pool: &PgPool, file_store: FileStore) -> PostService {
        let notifications = Arc::new(NotificationService::new(pool.clone(), None));
        let friends = Arc::new(FriendService::new(pool.clone(), notifications.clone()));
        PostService::new(pool.clone(), file_store, friends, notifications)
    }

    fn image(data: Vec<u8>) -> UploadedFile {
        UploadedFile {
            file_name: "photo.png".to_string(),
            mime_type: "image/png".to_string(),
            data,
        }
    }

    #[sqlx::test]
    async fn failed_media_persist_removes_stored_files(pool: PgPool) {
        testutil::setup(&pool).await;
        let author = testutil::create_user(&pool, "author").await;

        // Break the media insert so the failure happens after the file
        // has been written
        sqlx::query("ALTER TABLE social.post_media DROP COLUMN upload_order")
            .execute(&pool)
            .await
            .unwrap();

        let store = temp_store();
        let service = service(&pool, store.clone());

        let result = service
            .create_post(author, "with media", None, vec![image(vec![1, 2, 3])])
            .await;
        assert!(result.is_err());

        // The post rolled back and the file came off the disk
        let posts = testutil::count(
            &pool,
            "SELECT COUNT(*) FROM social.posts WHERE id > $1",
            0,
        )
        .await;
        assert_eq!(posts, 0);

        let leftovers = match std::fs::read_dir(store.root().join(POST_MEDIA_DIR)) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        };
        assert_eq!(leftovers, 0);
    }

    #[sqlx::test]
    async fn deleting_a_post_clears_comment_notifications(pool: PgPool) {
        testutil::setup(&pool).await;
        let author = testutil::create_user(&pool, "author").await;
        let commenter = testutil::create_user(&pool, "commenter").await;
        let post_id = testutil::create_post(&pool, author, "hello").await;

        let comment_id: i64 = sqlx::query(
            "INSERT INTO social.comments (post_id, user_id, content)
             VALUES ($1, $2, 'nice') RETURNING id",
        )
        .bind(post_id)
        .bind(commenter)
        .fetch_one(&pool)
        .await
        .unwrap()
        .get(0);

        let notifications = NotificationService::new(pool.clone(), None);
        notifications
            .notify_post_commented(author, commenter, comment_id)
            .await
            .unwrap();

        let service = service(&pool, temp_store());
        service.delete_post(post_id, author).await.unwrap();

        // The notification cleanup runs off the request path
        let mut remaining = 1;
        for _ in 0..50 {
            remaining = testutil::count(
                &pool,
                "SELECT COUNT(*) FROM social.notifications WHERE entity_id = $1",
                comment_id,
            )
            .await;
            if remaining == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(remaining, 0);
    }
}
