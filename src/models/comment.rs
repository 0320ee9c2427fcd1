//! Comment model matching the frontend comment section shape.

use serde::{Deserialize, Serialize};

/// A reader or admin response attached to a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub content: String,
    /// Identity used for ownership checks, never verified server-side
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: String,
}

/// Request body for adding a comment to a post.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub email: Option<String>,
}
