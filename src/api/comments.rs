//! Comment API endpoints.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Comment, CreateCommentRequest};
use crate::AppState;

/// GET /api/posts/:id/comments - Comments for a post, newest first.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Vec<Comment>> {
    let comments = state.store.list_comments(&post_id).await?;
    success(comments)
}

/// POST /api/posts/:id/comments - Add a comment.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> ApiResult<Comment> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation(
            "Comment content is required".to_string(),
        ));
    }

    let comment = state
        .store
        .add_comment(&post_id, &request.author, content, request.email)
        .await?;
    success(comment)
}

/// DELETE /api/comments/:id - Delete a comment. Unknown ids are a no-op.
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.store.delete_comment(&id).await?;
    success(())
}

/// GET /api/comments/export - Download every comment as a JSON backup.
///
/// There is no cascading delete or migration tooling, so this is the
/// administrative escape hatch.
pub async fn export_comments(State(state): State<AppState>) -> Result<Response, AppError> {
    let comments = state.store.export_comments().await?;
    let body = serde_json::to_vec_pretty(&comments)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"comments-export.json\"",
            ),
        ],
        body,
    )
        .into_response())
}
