//! Post model matching the frontend blog API shape.

use serde::{Deserialize, Serialize};

/// A blog article with publish state, content, and metadata.
///
/// Serialized in snake_case, the shape the frontend persists and renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub content: String,
    /// Empty string, a data URI, or a hosted URL
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub published: bool,
    /// ISO date (YYYY-MM-DD), set by the store when absent
    #[serde(default)]
    pub published_date: String,
    /// Estimated minutes to read, always at least 1
    #[serde(default = "default_reading_time")]
    pub reading_time: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

fn default_reading_time() -> u32 {
    1
}

/// Request body for creating a new post.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    /// Explicit id (slug); generated when absent
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub reading_time: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for updating an existing post.
///
/// Absent fields are preserved from the stored record. `cover_image` is only
/// overwritten when present, so `Some("")` clears it and `None` leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}
