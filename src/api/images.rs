//! Image upload endpoint.

use axum::extract::{Multipart, State};
use serde::Serialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::AppState;

/// Response body for a successful upload; `file_url` goes straight into a
/// post's `cover_image`.
#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub file_url: String,
}

/// POST /api/images - Ingest a cover image from a multipart `file` field.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<UploadResult> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;

        let file_url = state.store.upload_image(data).await?;
        return success(UploadResult { file_url });
    }

    Err(AppError::Validation(
        "Upload must include a 'file' field".to_string(),
    ))
}
