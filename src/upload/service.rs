use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use uuid::Uuid;

const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

const ALLOWED_VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/avi",
    "video/mov",
    "video/wmv",
    "video/webm",
];

const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024; // 10MB for images
const MAX_VIDEO_SIZE: usize = 50 * 1024 * 1024; // 50MB for videos

const UPLOADS_PATH: &str = "/uploads/";

/// Category of an uploaded file, derived from its declared MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Video,
}

impl FileCategory {
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        if ALLOWED_IMAGE_TYPES.contains(&mime_type) {
            Some(Self::Image)
        } else if ALLOWED_VIDEO_TYPES.contains(&mime_type) {
            Some(Self::Video)
        } else {
            None
        }
    }

    pub fn max_size(self) -> usize {
        match self {
            Self::Image => MAX_IMAGE_SIZE,
            Self::Video => MAX_VIDEO_SIZE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// A file received from a multipart form, not yet persisted
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Result of a successful save
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Public path, served under /uploads
    pub public_path: String,
    pub category: FileCategory,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Cannot upload empty file")]
    EmptyFile,

    #[error("File type not allowed: {0}")]
    DisallowedType(String),

    #[error("File size exceeds maximum allowed size of {0}")]
    TooLarge(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores uploaded media under a configured root directory.
///
/// The root comes from AppConfig at construction; nothing here reads
/// process-wide state.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a declared MIME type against the image/video allow-lists
    pub fn is_valid_type(&self, mime_type: &str) -> bool {
        FileCategory::from_mime(mime_type).is_some()
    }

    /// Validate and persist one file under `{root}/{directory}`, returning
    /// its public path. Nothing is written when validation fails.
    pub async fn save(
        &self,
        file: &UploadedFile,
        directory: &str,
    ) -> Result<StoredFile, UploadError> {
        if file.data.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        let category = FileCategory::from_mime(&file.mime_type)
            .ok_or_else(|| UploadError::DisallowedType(file.mime_type.clone()))?;

        if file.data.len() > category.max_size() {
            let limit = match category {
                FileCategory::Image => "10MB",
                FileCategory::Video => "50MB",
            };
            return Err(UploadError::TooLarge(limit));
        }

        let target_dir = self.root.join(directory);
        tokio::fs::create_dir_all(&target_dir).await?;

        let extension = file
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{}", ext))
            .unwrap_or_default();
        let unique_name = format!("{}{}", Uuid::new_v4(), extension);

        let target = target_dir.join(&unique_name);
        tokio::fs::write(&target, &file.data).await?;

        info!("File uploaded successfully: {}", target.display());

        Ok(StoredFile {
            public_path: format!("{}{}/{}", UPLOADS_PATH, directory, unique_name),
            category,
        })
    }

    /// Delete a stored file by its public path. A missing file is logged
    /// and reported as false, not treated as a failure.
    pub async fn delete(&self, public_path: &str) -> bool {
        let relative = public_path
            .strip_prefix(UPLOADS_PATH)
            .unwrap_or(public_path);
        let target = self.root.join(relative);

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                info!("File deleted successfully: {}", target.display());
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("File not found for deletion: {}", target.display());
                false
            }
            Err(e) => {
                error!("Error deleting file {}: {}", target.display(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FileStore {
        let dir = std::env::temp_dir().join(format!("file-store-test-{}", Uuid::new_v4()));
        FileStore::new(dir)
    }

    fn image(data: Vec<u8>) -> UploadedFile {
        UploadedFile {
            file_name: "photo.png".to_string(),
            mime_type: "image/png".to_string(),
            data,
        }
    }

    #[tokio::test]
    async fn save_and_delete_round_trip() {
        let store = temp_store();
        let stored = store.save(&image(vec![1, 2, 3]), "posts").await.unwrap();

        assert!(stored.public_path.starts_with("/uploads/posts/"));
        assert!(stored.public_path.ends_with(".png"));
        assert_eq!(stored.category, FileCategory::Image);

        let relative = stored.public_path.strip_prefix("/uploads/").unwrap();
        assert!(store.root().join(relative).exists());

        assert!(store.delete(&stored.public_path).await);
        assert!(!store.root().join(relative).exists());
    }

    #[tokio::test]
    async fn deleting_missing_file_reports_false() {
        let store = temp_store();
        assert!(!store.delete("/uploads/posts/never-existed.png").await);
    }

    #[tokio::test]
    async fn disallowed_type_is_rejected_and_nothing_written() {
        let store = temp_store();
        let file = UploadedFile {
            file_name: "script.sh".to_string(),
            mime_type: "application/x-sh".to_string(),
            data: vec![1],
        };

        let result = store.save(&file, "posts").await;
        assert!(matches!(result, Err(UploadError::DisallowedType(_))));
        assert!(!store.root().join("posts").exists());
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let store = temp_store();
        let result = store.save(&image(Vec::new()), "posts").await;
        assert!(matches!(result, Err(UploadError::EmptyFile)));
    }

    #[tokio::test]
    async fn image_at_ceiling_ok_one_byte_over_fails() {
        let store = temp_store();

        let at_limit = image(vec![0u8; 10 * 1024 * 1024]);
        assert!(store.save(&at_limit, "posts").await.is_ok());

        let over_limit = image(vec![0u8; 10 * 1024 * 1024 + 1]);
        assert!(matches!(
            store.save(&over_limit, "posts").await,
            Err(UploadError::TooLarge("10MB"))
        ));
    }

    #[test]
    fn video_ceiling_is_larger_than_image_ceiling() {
        assert!(FileCategory::Video.max_size() > FileCategory::Image.max_size());
        assert_eq!(FileCategory::from_mime("video/mp4"), Some(FileCategory::Video));
        assert_eq!(FileCategory::from_mime("text/plain"), None);
    }
}
