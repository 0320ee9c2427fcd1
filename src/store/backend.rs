//! Storage backend contract.
//!
//! Exactly one implementation is active per process, selected at startup from
//! configuration. Shared validation and derivation (id generation, reading
//! time, timestamps, author fallback) live above this trait in the store; the
//! backends only move records.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::image_pipeline::ProcessedImage;
use crate::models::{Comment, Post, StorageUsage};

#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// All posts in natural (insertion) order.
    async fn list_posts(&self) -> Result<Vec<Post>, AppError>;

    async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError>;

    /// Insert or replace by `post.id`, preserving insertion order on replace.
    async fn put_post(&self, post: &Post) -> Result<(), AppError>;

    /// Idempotent removal.
    async fn delete_post(&self, id: &str) -> Result<(), AppError>;

    /// Comments for one post, storage order.
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError>;

    /// Every comment across all posts, for the export backup.
    async fn all_comments(&self) -> Result<Vec<Comment>, AppError>;

    async fn put_comment(&self, comment: &Comment) -> Result<(), AppError>;

    /// Idempotent removal.
    async fn delete_comment(&self, id: &str) -> Result<(), AppError>;

    /// Whether the one-time seed has already run (or been suppressed).
    async fn is_seeded(&self) -> Result<bool, AppError>;

    /// Persistently suppress all future seeding.
    async fn mark_seeded(&self) -> Result<(), AppError>;

    /// Persist a processed image, returning the string callers store in
    /// `cover_image`: a data URI or a hosted URL, depending on the backend.
    async fn store_image(&self, image: &ProcessedImage) -> Result<String, AppError>;

    /// Local-store usage report. Backends without a byte quota reject this.
    async fn usage(&self) -> Result<StorageUsage, AppError>;
}
