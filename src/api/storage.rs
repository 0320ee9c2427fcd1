//! Storage maintenance endpoints (local backend only).

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::{RecompressSummary, StorageUsage};
use crate::AppState;

/// GET /api/storage/usage - Total and per-key size of the local store.
pub async fn storage_usage(State(state): State<AppState>) -> ApiResult<StorageUsage> {
    let usage = state.store.storage_usage().await?;
    success(usage)
}

/// POST /api/storage/recompress - Re-run oversized embedded cover images
/// through the compression ladder.
pub async fn recompress_images(State(state): State<AppState>) -> ApiResult<RecompressSummary> {
    let summary = state.store.recompress_cover_images().await?;
    success(summary)
}
