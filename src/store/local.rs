//! Local storage backend.
//!
//! SQLite-resident key-value store carrying the same contract the frontend
//! used against browser local storage: whole collections serialized as JSON
//! strings under well-known keys, with an enforced byte quota. Writes that
//! would exceed the quota fail with a descriptive storage-full error instead
//! of an opaque database failure.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use super::backend::StoreBackend;
use crate::errors::AppError;
use crate::image_pipeline::ProcessedImage;
use crate::models::{Comment, Post, StorageEntry, StorageUsage};

const POSTS_KEY: &str = "personal_blog.posts";
const COMMENTS_KEY: &str = "personal_blog.comments";
const SEEDED_KEY: &str = "personal_blog.seeded";

/// Local persistent key-value store with a byte quota.
#[derive(Clone)]
pub struct LocalBackend {
    pool: SqlitePool,
    quota_bytes: u64,
}

impl LocalBackend {
    /// Open (or create) the store at `db_path` and run migrations.
    pub async fn open(db_path: &Path, quota_bytes: u64) -> Result<Self, AppError> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(AppError::from)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool, quota_bytes })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    /// Upsert a value, enforcing the quota across the whole store.
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) AS used FROM kv WHERE key != ?",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;
        let used: i64 = row.get("used");
        let projected = used as u64 + value.len() as u64;

        if projected > self.quota_bytes {
            return Err(AppError::StorageFull(format!(
                "Local storage is full: writing {} would use {} of {} bytes",
                key, projected, self.quota_bytes
            )));
        }

        sqlx::query("INSERT INTO kv (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn read_posts(&self) -> Result<Vec<Post>, AppError> {
        match self.get(POSTS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_posts(&self, posts: &[Post]) -> Result<(), AppError> {
        self.set(POSTS_KEY, &serde_json::to_string(posts)?).await
    }

    async fn read_comments(&self) -> Result<Vec<Comment>, AppError> {
        match self.get(COMMENTS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_comments(&self, comments: &[Comment]) -> Result<(), AppError> {
        self.set(COMMENTS_KEY, &serde_json::to_string(comments)?).await
    }
}

#[async_trait]
impl StoreBackend for LocalBackend {
    async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        self.read_posts().await
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        Ok(self.read_posts().await?.into_iter().find(|p| p.id == id))
    }

    async fn put_post(&self, post: &Post) -> Result<(), AppError> {
        let mut posts = self.read_posts().await?;
        match posts.iter_mut().find(|p| p.id == post.id) {
            Some(existing) => *existing = post.clone(),
            None => posts.push(post.clone()),
        }
        self.write_posts(&posts).await
    }

    async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        let mut posts = self.read_posts().await?;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() != before {
            self.write_posts(&posts).await?;
        }
        Ok(())
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        Ok(self
            .read_comments()
            .await?
            .into_iter()
            .filter(|c| c.post_id == post_id)
            .collect())
    }

    async fn all_comments(&self) -> Result<Vec<Comment>, AppError> {
        self.read_comments().await
    }

    async fn put_comment(&self, comment: &Comment) -> Result<(), AppError> {
        let mut comments = self.read_comments().await?;
        match comments.iter_mut().find(|c| c.id == comment.id) {
            Some(existing) => *existing = comment.clone(),
            None => comments.push(comment.clone()),
        }
        self.write_comments(&comments).await
    }

    async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        let mut comments = self.read_comments().await?;
        let before = comments.len();
        comments.retain(|c| c.id != id);
        if comments.len() != before {
            self.write_comments(&comments).await?;
        }
        Ok(())
    }

    async fn is_seeded(&self) -> Result<bool, AppError> {
        Ok(self.get(SEEDED_KEY).await?.is_some())
    }

    async fn mark_seeded(&self) -> Result<(), AppError> {
        self.set(SEEDED_KEY, "true").await
    }

    async fn store_image(&self, image: &ProcessedImage) -> Result<String, AppError> {
        Ok(image.to_data_uri())
    }

    async fn usage(&self) -> Result<StorageUsage, AppError> {
        let rows = sqlx::query(
            "SELECT key, LENGTH(CAST(value AS BLOB)) AS bytes FROM kv ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        let entries: Vec<StorageEntry> = rows
            .into_iter()
            .map(|row| {
                let bytes: i64 = row.get("bytes");
                StorageEntry {
                    key: row.get("key"),
                    bytes: bytes as u64,
                }
            })
            .collect();

        Ok(StorageUsage {
            total_bytes: entries.iter().map(|e| e.bytes).sum(),
            quota_bytes: self.quota_bytes,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed;
    use tempfile::TempDir;

    async fn open_backend(quota: u64) -> (LocalBackend, TempDir) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let backend = LocalBackend::open(&dir.path().join("test.sqlite"), quota)
            .await
            .expect("Failed to open local backend");
        (backend, dir)
    }

    #[tokio::test]
    async fn test_post_round_trip() {
        let (backend, _dir) = open_backend(1024 * 1024).await;
        let post = seed::default_posts().remove(0);

        backend.put_post(&post).await.unwrap();
        let fetched = backend.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(fetched, post);

        backend.delete_post(&post.id).await.unwrap();
        assert!(backend.get_post(&post.id).await.unwrap().is_none());
        // Deleting again is a no-op
        backend.delete_post(&post.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_put_replaces_in_place() {
        let (backend, _dir) = open_backend(1024 * 1024).await;
        for post in seed::default_posts() {
            backend.put_post(&post).await.unwrap();
        }

        let mut updated = seed::default_posts().remove(0);
        updated.title = "Replaced".to_string();
        backend.put_post(&updated).await.unwrap();

        let posts = backend.list_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
        // Natural order preserved: the replaced post keeps its slot
        assert_eq!(posts[0].title, "Replaced");
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_storage_full() {
        let (backend, _dir) = open_backend(512).await;
        let mut post = seed::default_posts().remove(0);
        post.content = "x".repeat(2048);

        let err = backend.put_post(&post).await.unwrap_err();
        assert!(matches!(err, AppError::StorageFull(_)));
    }

    #[tokio::test]
    async fn test_seed_marker_persists() {
        let (backend, _dir) = open_backend(1024 * 1024).await;
        assert!(!backend.is_seeded().await.unwrap());
        backend.mark_seeded().await.unwrap();
        assert!(backend.is_seeded().await.unwrap());
    }

    #[tokio::test]
    async fn test_usage_reports_per_key_breakdown() {
        let (backend, _dir) = open_backend(1024 * 1024).await;
        backend.put_post(&seed::default_posts().remove(0)).await.unwrap();
        backend.mark_seeded().await.unwrap();

        let usage = backend.usage().await.unwrap();
        assert_eq!(usage.quota_bytes, 1024 * 1024);
        assert_eq!(usage.entries.len(), 2);
        assert!(usage.total_bytes > 0);
        assert_eq!(
            usage.total_bytes,
            usage.entries.iter().map(|e| e.bytes).sum::<u64>()
        );
    }
}
