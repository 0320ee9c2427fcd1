//! Configuration module for the blog backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! The presence of a complete remote configuration decides the storage backend
//! for the lifetime of the process.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default byte quota for the local key-value store, mirroring the browser quota
/// the original deployment lived under.
pub const DEFAULT_LOCAL_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Connection settings for the hosted document database.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the document database API
    pub base_url: String,
    /// API key sent with every request
    pub api_key: String,
    /// Optional object storage endpoint for image uploads
    pub media_url: Option<String>,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin password for the authoring gate (verification always fails when unset)
    pub admin_password: Option<String>,
    /// Path to the local SQLite store
    pub db_path: PathBuf,
    /// Byte quota enforced on the local store
    pub local_quota_bytes: u64,
    /// Remote document database settings; local mode when absent
    pub remote: Option<RemoteConfig>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let admin_password = env::var("BLOG_ADMIN_PASSWORD").ok().filter(|s| !s.is_empty());

        let db_path = env::var("BLOG_DATA_PATH")
            .unwrap_or_else(|_| "./data/blog.sqlite".to_string())
            .into();

        let local_quota_bytes = env::var("BLOG_LOCAL_QUOTA_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_LOCAL_QUOTA_BYTES);

        let remote = Self::remote_from_env();

        let bind_addr = env::var("BLOG_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid BLOG_BIND_ADDR format");

        let log_level = env::var("BLOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            admin_password,
            db_path,
            local_quota_bytes,
            remote,
            bind_addr,
            log_level,
        }
    }

    /// Remote mode requires both the base URL and the API key. A partial
    /// configuration is treated as absent and logged, so the process falls
    /// back to the local store instead of failing on every request.
    fn remote_from_env() -> Option<RemoteConfig> {
        let base_url = env::var("BLOG_REMOTE_URL").ok().filter(|s| !s.is_empty());
        let api_key = env::var("BLOG_REMOTE_API_KEY").ok().filter(|s| !s.is_empty());
        let media_url = env::var("BLOG_MEDIA_URL").ok().filter(|s| !s.is_empty());

        match (base_url, api_key) {
            (Some(base_url), Some(api_key)) => Some(RemoteConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
                media_url: media_url.map(|u| u.trim_end_matches('/').to_string()),
            }),
            (None, None) => None,
            _ => {
                tracing::warn!(
                    "Incomplete remote configuration (need both BLOG_REMOTE_URL and \
                     BLOG_REMOTE_API_KEY). Falling back to local storage."
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("BLOG_ADMIN_PASSWORD");
        env::remove_var("BLOG_DATA_PATH");
        env::remove_var("BLOG_LOCAL_QUOTA_BYTES");
        env::remove_var("BLOG_REMOTE_URL");
        env::remove_var("BLOG_REMOTE_API_KEY");
        env::remove_var("BLOG_MEDIA_URL");
        env::remove_var("BLOG_BIND_ADDR");
        env::remove_var("BLOG_LOG_LEVEL");

        let config = Config::from_env();

        assert!(config.admin_password.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/blog.sqlite"));
        assert_eq!(config.local_quota_bytes, DEFAULT_LOCAL_QUOTA_BYTES);
        assert!(config.remote.is_none());
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
    }
}
