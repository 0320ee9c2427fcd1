//! Remote storage backend.
//!
//! Thin client for a hosted document database: collection endpoints keyed by
//! entity id, plus an optional object storage endpoint for image uploads.
//! Connectivity failures map to the backend-unavailable error; the store layer
//! above decides which reads degrade to seed data instead of surfacing them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use super::backend::StoreBackend;
use crate::config::RemoteConfig;
use crate::errors::AppError;
use crate::image_pipeline::ProcessedImage;
use crate::models::{Comment, Post, StorageUsage};

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the hosted document database and object storage.
pub struct RemoteBackend {
    client: reqwest::Client,
    base_url: String,
    media_url: Option<String>,
}

impl RemoteBackend {
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut key_value = reqwest::header::HeaderValue::from_str(&config.api_key)
            .map_err(|_| AppError::Unavailable("Remote API key is not a valid header value".to_string()))?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(AppError::from)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            media_url: config.media_url.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/collections/{}", self.base_url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/collections/{}/{}", self.base_url, collection, id)
    }
}

#[async_trait]
impl StoreBackend for RemoteBackend {
    async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let resp = self
            .client
            .get(self.collection_url("posts"))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let resp = self.client.get(self.document_url("posts", id)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(resp.error_for_status()?.json().await?))
    }

    async fn put_post(&self, post: &Post) -> Result<(), AppError> {
        self.client
            .put(self.document_url("posts", &post.id))
            .json(post)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        let resp = self.client.delete(self.document_url("posts", id)).send().await?;
        if resp.status() != StatusCode::NOT_FOUND {
            resp.error_for_status()?;
        }
        Ok(())
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        let resp = self
            .client
            .get(self.collection_url("comments"))
            .query(&[("postId", post_id)])
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn all_comments(&self) -> Result<Vec<Comment>, AppError> {
        let resp = self
            .client
            .get(self.collection_url("comments"))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn put_comment(&self, comment: &Comment) -> Result<(), AppError> {
        self.client
            .put(self.document_url("comments", &comment.id))
            .json(comment)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        let resp = self
            .client
            .delete(self.document_url("comments", id))
            .send()
            .await?;
        if resp.status() != StatusCode::NOT_FOUND {
            resp.error_for_status()?;
        }
        Ok(())
    }

    async fn is_seeded(&self) -> Result<bool, AppError> {
        let resp = self.client.get(self.document_url("meta", "seeded")).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        resp.error_for_status()?;
        Ok(true)
    }

    async fn mark_seeded(&self) -> Result<(), AppError> {
        self.client
            .put(self.document_url("meta", "seeded"))
            .json(&json!({ "seeded": true }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn store_image(&self, image: &ProcessedImage) -> Result<String, AppError> {
        // Without object storage the encoded image rides inside the document,
        // which the ingestion ceiling already keeps below the size limit.
        let Some(media_url) = &self.media_url else {
            return Ok(image.to_data_uri());
        };

        #[derive(serde::Deserialize)]
        struct UploadResponse {
            url: String,
        }

        let resp: UploadResponse = self
            .client
            .post(format!("{}/upload", media_url))
            .header(reqwest::header::CONTENT_TYPE, image.content_type)
            .body(image.data.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.url)
    }

    async fn usage(&self) -> Result<StorageUsage, AppError> {
        Err(AppError::Validation(
            "Storage usage reporting is only available for the local backend".to_string(),
        ))
    }
}
