//! AtivePlay ingestion core
//!
//! Playlist (extended M3U) and program guide (XMLTV) ingestion for the
//! AtivePlay TV app, with the HTTP surface the app polls.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::services::fetcher::HttpFetcher;
use crate::services::loader::IngestLoader;

pub use crate::error::{IngestError, Result};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub loader: IngestLoader<HttpFetcher>,
    pub start_time: Instant,
}

impl AppState {
    /// Build fetchers and loader from the configuration
    pub fn new(config: Config) -> Result<Self> {
        let playlist_fetcher = HttpFetcher::new(
            &config.user_agent,
            config.fetch_timeout_ms,
            config.max_retries,
            config.max_m3u_size_mb,
        )?;
        let epg_fetcher = HttpFetcher::new(
            &config.user_agent,
            config.fetch_timeout_ms,
            config.max_retries,
            config.max_epg_size_mb,
        )?;
        let loader = IngestLoader::new(playlist_fetcher, epg_fetcher, config.classifier());

        Ok(Self {
            config,
            loader,
            start_time: Instant::now(),
        })
    }
}

/// Router with all endpoints and middleware
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/ready", get(routes::health::ready))
        .route("/live", get(routes::health::live))
        // Playlist endpoints
        .route("/api/playlist/load", post(routes::playlist::load_playlist))
        .route("/api/playlist/entries", get(routes::playlist::get_entries))
        .route("/api/playlist/stats", get(routes::playlist::get_stats))
        // Guide endpoints
        .route("/api/epg/load", post(routes::epg::load_epg))
        .route("/api/epg/:channel_id/now", get(routes::epg::now_next))
        // Xtream panel helpers
        .route("/api/xtream/urls", post(routes::xtream::panel_urls))
        .route(
            "/api/xtream/validate/:kind",
            post(routes::xtream::validate_listing),
        )
        // Logout
        .route("/api/session", delete(routes::epg::reset_session))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
