//! Content store: CRUD over posts and comments plus image ingestion.
//!
//! One backend is chosen at startup (remote document database when configured,
//! local key-value storage otherwise) and kept for the lifetime of the
//! process. Validation-adjacent derivation (id generation, reading time,
//! timestamps, tag normalization, the comment author fallback) lives here so
//! both backends share it. Remote list reads degrade to the bundled seed
//! dataset so the site is never blank; writes always surface failures.

mod backend;
mod local;
mod remote;
pub mod seed;

pub use backend::StoreBackend;
pub use local::LocalBackend;
pub use remote::RemoteBackend;

use bytes::Bytes;
use chrono::{NaiveDate, Utc};

use crate::config::Config;
use crate::errors::AppError;
use crate::image_pipeline;
use crate::models::{
    Comment, CreatePostRequest, Post, RecompressSummary, StorageUsage, UpdatePostRequest,
};

/// Embedded cover images above this size are candidates for the maintenance
/// recompression pass.
const RECOMPRESS_THRESHOLD_BYTES: usize = 500 * 1024;

/// Which backend the process is running against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Local,
    Remote,
}

/// Sort order for post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest first (`-published_date`)
    PublishedDateDesc,
    /// Oldest first (`published_date`)
    PublishedDateAsc,
    /// Storage order
    Natural,
}

impl SortOrder {
    pub fn parse(s: &str) -> Self {
        match s {
            "-published_date" => SortOrder::PublishedDateDesc,
            "published_date" => SortOrder::PublishedDateAsc,
            _ => SortOrder::Natural,
        }
    }
}

/// Facade over the active storage backend.
pub struct ContentStore {
    backend: Box<dyn StoreBackend>,
    mode: BackendMode,
}

impl ContentStore {
    /// Select the backend from configuration, open it, and run the one-time
    /// seed. A remote backend that cannot be reached at startup is tolerated:
    /// reads fall back to seed data and writes surface their own failures.
    pub async fn open(config: &Config) -> Result<Self, AppError> {
        let (backend, mode): (Box<dyn StoreBackend>, BackendMode) = match &config.remote {
            Some(remote) => (Box::new(RemoteBackend::new(remote)?), BackendMode::Remote),
            None => (
                Box::new(LocalBackend::open(&config.db_path, config.local_quota_bytes).await?),
                BackendMode::Local,
            ),
        };

        let store = Self { backend, mode };

        match store.ensure_seeded().await {
            Ok(()) => {}
            Err(e) if store.mode == BackendMode::Remote => {
                tracing::warn!(error = %e, "Could not verify seed state of remote backend");
            }
            Err(e) => return Err(e),
        }

        Ok(store)
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Seed default content exactly once. Pre-existing data suppresses the
    /// seed, and the persistent marker keeps an intentionally emptied store
    /// empty forever after.
    async fn ensure_seeded(&self) -> Result<(), AppError> {
        if self.backend.is_seeded().await? {
            return Ok(());
        }

        let existing = self.backend.list_posts().await?;
        if existing.is_empty() {
            for post in seed::default_posts() {
                self.backend.put_post(&post).await?;
            }
            for comment in seed::default_comments() {
                self.backend.put_comment(&comment).await?;
            }
            tracing::info!("Seeded empty backend with default content");
        }

        self.backend.mark_seeded().await
    }

    /// All posts, published and unpublished; callers filter by audience.
    pub async fn list_posts(&self, order: SortOrder) -> Result<Vec<Post>, AppError> {
        let posts = match self.mode {
            BackendMode::Local => self.backend.list_posts().await?,
            BackendMode::Remote => match self.backend.list_posts().await {
                Ok(posts) if !posts.is_empty() => posts,
                Ok(_) => {
                    tracing::warn!("Remote post collection is empty, serving seed dataset");
                    seed::default_posts()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Remote post list failed, serving seed dataset");
                    seed::default_posts()
                }
            },
        };

        Ok(sort_posts(posts, order))
    }

    /// Single post lookup; absence is a `None`, not an error.
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        self.backend.get_post(id).await
    }

    pub async fn create_post(&self, request: CreatePostRequest) -> Result<Post, AppError> {
        let id = match request.id.filter(|s| !s.trim().is_empty()) {
            Some(id) => {
                if self.backend.get_post(&id).await?.is_some() {
                    return Err(AppError::Validation(format!(
                        "A post with id {} already exists",
                        id
                    )));
                }
                id
            }
            None => uuid::Uuid::new_v4().to_string(),
        };

        let now = Utc::now().to_rfc3339();
        let reading_time = request
            .reading_time
            .filter(|&minutes| minutes >= 1)
            .unwrap_or_else(|| compute_reading_time(&request.content));

        let post = Post {
            id,
            title: request.title,
            excerpt: request.excerpt,
            content: request.content,
            cover_image: request.cover_image.unwrap_or_default(),
            published: request.published,
            published_date: request
                .published_date
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| Utc::now().date_naive().to_string()),
            reading_time,
            tags: normalize_tags(request.tags),
            created_at: now.clone(),
            updated_at: now,
        };

        self.backend.put_post(&post).await?;
        Ok(post)
    }

    /// Shallow-merge `patch` onto the stored post. Reading time is recomputed
    /// only when the patch carries new content; `cover_image` changes only
    /// when present in the patch, so an explicit empty string clears it.
    pub async fn update_post(&self, id: &str, patch: UpdatePostRequest) -> Result<Post, AppError> {
        let mut post = self
            .backend
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(excerpt) = patch.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(content) = patch.content {
            post.reading_time = compute_reading_time(&content);
            post.content = content;
        }
        if let Some(cover_image) = patch.cover_image {
            post.cover_image = cover_image;
        }
        if let Some(published) = patch.published {
            post.published = published;
        }
        if let Some(published_date) = patch.published_date {
            post.published_date = published_date;
        }
        if let Some(tags) = patch.tags {
            post.tags = normalize_tags(tags);
        }
        post.updated_at = Utc::now().to_rfc3339();

        self.backend.put_post(&post).await?;
        Ok(post)
    }

    /// Idempotent; deleting a missing post is a no-op. Comments on the post
    /// are intentionally left in place.
    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        self.backend.delete_post(id).await
    }

    /// Comments for one post, newest first.
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        let comments = match self.mode {
            BackendMode::Local => self.backend.list_comments(post_id).await?,
            BackendMode::Remote => match self.backend.list_comments(post_id).await {
                Ok(comments) => comments,
                Err(e) => {
                    tracing::warn!(error = %e, "Remote comment list failed, serving seed dataset");
                    seed::default_comments()
                        .into_iter()
                        .filter(|c| c.post_id == post_id)
                        .collect()
                }
            },
        };

        Ok(sort_comments_newest_first(comments))
    }

    /// `content` arrives validated and trimmed by the caller. A blank author
    /// falls back to the commenter's email, then to "Anonymous".
    pub async fn add_comment(
        &self,
        post_id: &str,
        author: &str,
        content: &str,
        email: Option<String>,
    ) -> Result<Comment, AppError> {
        let author = author.trim();
        let resolved_author = if !author.is_empty() {
            author.to_string()
        } else {
            email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| "Anonymous".to_string())
        };

        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            author: resolved_author,
            content: content.to_string(),
            email,
            created_at: Utc::now().to_rfc3339(),
        };

        self.backend.put_comment(&comment).await?;
        Ok(comment)
    }

    /// Idempotent; deleting a missing comment is a no-op.
    pub async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        self.backend.delete_comment(id).await
    }

    /// Every comment across all posts, newest first, for the backup download.
    pub async fn export_comments(&self) -> Result<Vec<Comment>, AppError> {
        Ok(sort_comments_newest_first(self.backend.all_comments().await?))
    }

    /// Run the ingestion pipeline and persist the result, bounded by the
    /// pipeline timeout. Returns the string callers put in `cover_image`.
    pub async fn upload_image(&self, data: Bytes) -> Result<String, AppError> {
        let work = async {
            let processed = image_pipeline::process_async(data).await?;
            self.backend.store_image(&processed).await
        };

        match tokio::time::timeout(image_pipeline::PIPELINE_TIMEOUT, work).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(
                "Image processing took too long and was aborted".to_string(),
            )),
        }
    }

    pub async fn storage_usage(&self) -> Result<StorageUsage, AppError> {
        self.backend.usage().await
    }

    /// One-shot maintenance pass over stored posts: embedded cover images
    /// above the threshold are re-run through the compression ladder and
    /// rewritten when that made them smaller. Per-post failures are logged
    /// and skipped.
    pub async fn recompress_cover_images(&self) -> Result<RecompressSummary, AppError> {
        if self.mode == BackendMode::Remote {
            return Err(AppError::Validation(
                "Cover image recompression is only available for the local backend".to_string(),
            ));
        }

        let posts = self.backend.list_posts().await?;
        let mut summary = RecompressSummary {
            scanned: posts.len(),
            compressed: 0,
            bytes_saved: 0,
        };

        for mut post in posts {
            let Some((mime, data)) = image_pipeline::decode_data_uri(&post.cover_image) else {
                continue;
            };
            if !mime.starts_with("image/") || data.len() <= RECOMPRESS_THRESHOLD_BYTES {
                continue;
            }

            let old_len = post.cover_image.len();
            match image_pipeline::process_async(Bytes::from(data)).await {
                Ok(processed) => {
                    let new_uri = processed.to_data_uri();
                    if new_uri.len() < old_len {
                        summary.bytes_saved += (old_len - new_uri.len()) as u64;
                        summary.compressed += 1;
                        post.cover_image = new_uri;
                        self.backend.put_post(&post).await?;
                        tracing::info!(post_id = %post.id, "Recompressed cover image");
                    }
                }
                Err(e) => {
                    tracing::warn!(post_id = %post.id, error = %e, "Failed to recompress cover image");
                }
            }
        }

        Ok(summary)
    }
}

/// `max(1, ceil(word_count / 200))`.
pub fn compute_reading_time(content: &str) -> u32 {
    let words = content.split_whitespace().count() as u32;
    ((words + 199) / 200).max(1)
}

/// Trim, drop empties, and dedup while preserving insertion order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Posts with a missing or unparseable date sort as earliest. Sorting is
/// stable, so ties keep the collection's natural order.
fn sort_posts(mut posts: Vec<Post>, order: SortOrder) -> Vec<Post> {
    match order {
        SortOrder::PublishedDateDesc => {
            posts.sort_by_key(|p| std::cmp::Reverse(date_key(p)));
        }
        SortOrder::PublishedDateAsc => {
            posts.sort_by_key(date_key);
        }
        SortOrder::Natural => {}
    }
    posts
}

fn date_key(post: &Post) -> NaiveDate {
    NaiveDate::parse_from_str(&post.published_date, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}

fn sort_comments_newest_first(mut comments: Vec<Comment>) -> Vec<Comment> {
    comments.sort_by_key(|c| {
        std::cmp::Reverse(
            chrono::DateTime::parse_from_rfc3339(&c.created_at)
                .map(|dt| dt.timestamp_millis())
                .unwrap_or(i64::MIN),
        )
    });
    comments
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> ContentStore {
        let config = Config {
            admin_password: None,
            db_path: dir.path().join("store.sqlite"),
            local_quota_bytes: 5 * 1024 * 1024,
            remote: None,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        };
        ContentStore::open(&config).await.expect("Failed to open store")
    }

    fn create_request(title: &str, content: &str) -> CreatePostRequest {
        CreatePostRequest {
            id: None,
            title: title.to_string(),
            excerpt: String::new(),
            content: content.to_string(),
            cover_image: None,
            published: false,
            published_date: None,
            reading_time: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_reading_time_floor_is_one() {
        assert_eq!(compute_reading_time(""), 1);
        assert_eq!(compute_reading_time("one"), 1);
        assert_eq!(compute_reading_time(&"word ".repeat(200)), 1);
        assert_eq!(compute_reading_time(&"word ".repeat(201)), 2);
        assert_eq!(compute_reading_time(&"word ".repeat(450)), 3);
    }

    #[test]
    fn test_normalize_tags_dedups_in_order() {
        let tags = vec![
            " rust ".to_string(),
            "blog".to_string(),
            "rust".to_string(),
            "".to_string(),
        ];
        assert_eq!(normalize_tags(tags), vec!["rust", "blog"]);
    }

    #[test]
    fn test_sort_missing_dates_first_ascending() {
        let mut posts = seed::default_posts();
        posts[0].published_date = String::new();

        let ascending = sort_posts(posts.clone(), SortOrder::PublishedDateAsc);
        assert_eq!(ascending[0].published_date, "");

        let descending = sort_posts(posts, SortOrder::PublishedDateDesc);
        assert_eq!(descending.last().unwrap().published_date, "");
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("-published_date"), SortOrder::PublishedDateDesc);
        assert_eq!(SortOrder::parse("published_date"), SortOrder::PublishedDateAsc);
        assert_eq!(SortOrder::parse(""), SortOrder::Natural);
        assert_eq!(SortOrder::parse("title"), SortOrder::Natural);
    }

    #[tokio::test]
    async fn test_seeds_once_and_never_again() {
        let dir = TempDir::new().unwrap();

        let store = open_store(&dir).await;
        let posts = store.list_posts(SortOrder::Natural).await.unwrap();
        assert_eq!(posts.len(), seed::default_posts().len());

        for post in &posts {
            store.delete_post(&post.id).await.unwrap();
        }

        // A fresh store over the same data must not re-seed.
        let reopened = open_store(&dir).await;
        let posts = reopened.list_posts(SortOrder::Natural).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_create_post_derives_fields() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let content = "word ".repeat(450);
        let post = store
            .create_post(create_request("Hello", &content))
            .await
            .unwrap();

        assert!(!post.id.is_empty());
        assert_eq!(post.reading_time, 3);
        assert_eq!(post.cover_image, "");
        assert_eq!(post.published_date, Utc::now().date_naive().to_string());
        assert!(!post.created_at.is_empty());

        let fetched = store.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(fetched, post);
    }

    #[tokio::test]
    async fn test_create_post_keeps_explicit_reading_time() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let mut request = create_request("Hello", "short");
        request.reading_time = Some(7);
        let post = store.create_post(request).await.unwrap();
        assert_eq!(post.reading_time, 7);
    }

    #[tokio::test]
    async fn test_create_post_rejects_duplicate_id() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let mut request = create_request("Hello", "body");
        request.id = Some("my-slug".to_string());
        store.create_post(request.clone()).await.unwrap();

        let err = store.create_post(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_merges_and_recomputes() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let post = store
            .create_post(create_request("Hello", &"word ".repeat(450)))
            .await
            .unwrap();

        // Patch without content: reading time unchanged
        let updated = store
            .update_post(
                &post.id,
                UpdatePostRequest {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.reading_time, 3);
        assert_eq!(updated.content, post.content);
        assert_eq!(updated.created_at, post.created_at);

        // Patch with content: reading time recomputed
        let updated = store
            .update_post(
                &post.id,
                UpdatePostRequest {
                    content: Some("short".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.reading_time, 1);
    }

    #[tokio::test]
    async fn test_update_cover_image_tri_state() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let mut request = create_request("Hello", "body");
        request.cover_image = Some("https://cdn.example/cover.jpg".to_string());
        let post = store.create_post(request).await.unwrap();

        // Absent: unchanged
        let updated = store
            .update_post(&post.id, UpdatePostRequest::default())
            .await
            .unwrap();
        assert_eq!(updated.cover_image, "https://cdn.example/cover.jpg");

        // Explicit empty string: cleared
        let updated = store
            .update_post(
                &post.id,
                UpdatePostRequest {
                    cover_image: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.cover_image, "");
    }

    #[tokio::test]
    async fn test_update_missing_post_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let err = store
            .update_post("no-such-post", UpdatePostRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_comment_author_fallback_chain() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let with_email = store
            .add_comment("p1", "", "hello world", Some("a@gmail.com".to_string()))
            .await
            .unwrap();
        assert_eq!(with_email.author, "a@gmail.com");

        let anonymous = store.add_comment("p1", "  ", "hi", None).await.unwrap();
        assert_eq!(anonymous.author, "Anonymous");

        let named = store
            .add_comment("p1", "Ada", "hi", Some("a@gmail.com".to_string()))
            .await
            .unwrap();
        assert_eq!(named.author, "Ada");
    }

    #[tokio::test]
    async fn test_comments_listed_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        store.add_comment("p1", "first", "1", None).await.unwrap();
        store.add_comment("p1", "second", "2", None).await.unwrap();
        store.add_comment("other", "elsewhere", "3", None).await.unwrap();

        let comments = store.list_comments("p1").await.unwrap();
        assert_eq!(comments.len(), 2);
        assert!(comments[0].created_at >= comments[1].created_at);
        assert_eq!(comments[0].author, "second");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let err = store
            .upload_image(Bytes::from_static(b"plain text"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_remote_list_falls_back_to_seed_data() {
        // Nothing listens on this address, so every remote call fails fast.
        let config = Config {
            admin_password: None,
            db_path: "./unused.sqlite".into(),
            local_quota_bytes: 5 * 1024 * 1024,
            remote: Some(crate::config::RemoteConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                api_key: "test-key".to_string(),
                media_url: None,
            }),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        };

        let store = ContentStore::open(&config).await.unwrap();
        assert_eq!(store.mode(), BackendMode::Remote);

        let posts = store.list_posts(SortOrder::Natural).await.unwrap();
        assert_eq!(posts.len(), seed::default_posts().len());

        // Writes surface the failure instead of degrading.
        let err = store
            .create_post(CreatePostRequest {
                id: None,
                title: "t".to_string(),
                excerpt: String::new(),
                content: "c".to_string(),
                cover_image: None,
                published: false,
                published_date: None,
                reading_time: None,
                tags: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
    }
}
