//! Storage maintenance report models.

use serde::{Deserialize, Serialize};

/// Size of a single key in the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEntry {
    pub key: String,
    pub bytes: u64,
}

/// Total and per-key usage of the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub total_bytes: u64,
    pub quota_bytes: u64,
    pub entries: Vec<StorageEntry>,
}

/// Outcome of a cover-image recompression pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecompressSummary {
    pub scanned: usize,
    pub compressed: usize,
    pub bytes_saved: u64,
}
