//! Post API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreatePostRequest, Post, UpdatePostRequest};
use crate::store::SortOrder;
use crate::AppState;

/// Query string for post listings.
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    /// `-published_date` (default), `published_date`, or anything else for
    /// storage order
    #[serde(default)]
    pub order: Option<String>,
}

/// GET /api/posts - List all posts, published and drafts alike.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> ApiResult<Vec<Post>> {
    let order = SortOrder::parse(query.order.as_deref().unwrap_or("-published_date"));
    let posts = state.store.list_posts(order).await?;
    success(posts)
}

/// GET /api/posts/:id - Get a single post.
pub async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Post> {
    match state.store.get_post(&id).await? {
        Some(post) => success(post),
        None => Err(AppError::NotFound(format!("Post {} not found", id))),
    }
}

/// POST /api/posts - Create a new post.
pub async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> ApiResult<Post> {
    // Validate required fields
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("Content is required".to_string()));
    }

    let post = state.store.create_post(request).await?;
    success(post)
}

/// PUT /api/posts/:id - Update a post.
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePostRequest>,
) -> ApiResult<Post> {
    if let Some(title) = &request.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title cannot be empty".to_string()));
        }
    }
    if let Some(content) = &request.content {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Content cannot be empty".to_string()));
        }
    }

    let post = state.store.update_post(&id, request).await?;
    success(post)
}

/// DELETE /api/posts/:id - Delete a post. Deleting an unknown id is a no-op.
pub async fn delete_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.store.delete_post(&id).await?;
    success(())
}
