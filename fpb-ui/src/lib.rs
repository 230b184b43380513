//! fpb-ui library - Family Photo Browser web service
//!
//! Exposes the browsing pipeline as a JSON API: select a source or
//! global query, pick a search mode, filter, then step through the
//! resulting photos one at a time.

use axum::Router;
use fpb_common::config::Config;
use fpb_common::fetch::StorageFetcher;
use fpb_common::loader::TableLoader;
use fpb_common::session::BrowseSession;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Storage location and source registry
    pub config: Arc<Config>,
    /// Shared table loader and cache
    pub loader: Arc<TableLoader>,
    /// Active browse sessions
    pub sessions: Arc<RwLock<HashMap<Uuid, BrowseSession>>>,
}

impl AppState {
    /// Create new application state over the given storage fetcher
    pub fn new(config: Config, fetcher: Arc<dyn StorageFetcher>) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        Self {
            config: Arc::new(config),
            loader: Arc::new(TableLoader::new(fetcher, ttl)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// Preload every configured individual source table to warm the cache.
/// Failures are logged and retried on first use, never fatal.
pub async fn warm_up(state: &AppState) {
    for source in &state.config.sources {
        match state.loader.load(source).await {
            Ok(table) => info!(
                source_id = %source.id,
                rows = table.rows.len(),
                "preloaded source table"
            ),
            Err(e) => warn!(
                source_id = %source.id,
                error = %e,
                "failed to preload source table"
            ),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post};

    Router::new()
        .route("/api/sources", get(api::list_sources))
        .route("/api/session", post(api::create_session))
        .route("/api/session/:id", delete(api::close_session))
        .route("/api/session/:id/mode", post(api::set_mode))
        .route("/api/session/:id/filter", post(api::run_filter))
        .route("/api/session/:id/step", post(api::step))
        .route("/api/session/:id/reset", post(api::reset))
        .route("/api/session/:id/photo", get(api::current_photo))
        .route("/api/session/:id/results", get(api::list_results))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
