//! Personal Blog Backend
//!
//! A REST backend serving the blog frontend contract, with content stored in
//! either a local key-value store or a hosted document database.

mod api;
mod auth;
mod config;
mod errors;
mod image_pipeline;
mod models;
mod store;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use store::ContentStore;

/// Request bodies above this are refused before the ingestion pipeline runs;
/// the pipeline applies its own, tighter ceiling to the decoded file.
const MAX_UPLOAD_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Personal Blog Backend");
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if the admin password is not configured
    if config.admin_password.is_none() {
        tracing::warn!("No admin password configured (BLOG_ADMIN_PASSWORD). Authoring is disabled!");
    }

    // Select and open the storage backend
    let store = Arc::new(ContentStore::open(&config).await?);
    match store.mode() {
        store::BackendMode::Local => {
            tracing::info!("Using local storage backend at {:?}", config.db_path)
        }
        store::BackendMode::Remote => tracing::info!("Using remote document store backend"),
    }

    // Create application state
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Posts
        .route("/posts", get(api::list_posts))
        .route("/posts", post(api::create_post))
        .route("/posts/{id}", get(api::get_post))
        .route("/posts/{id}", put(api::update_post))
        .route("/posts/{id}", delete(api::delete_post))
        // Comments
        .route("/posts/{id}/comments", get(api::list_comments))
        .route("/posts/{id}/comments", post(api::add_comment))
        .route("/comments/export", get(api::export_comments))
        .route("/comments/{id}", delete(api::delete_comment))
        // Images
        .route("/images", post(api::upload_image))
        // Admin verification
        .route("/auth/verify", post(api::verify_password))
        // Storage maintenance
        .route("/storage/usage", get(api::storage_usage))
        .route("/storage/recompress", post(api::recompress_images));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
