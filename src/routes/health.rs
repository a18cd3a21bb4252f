use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Root endpoint - basic status
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "AtivePlay Ingest",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "runtime": "rust"
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistHealth {
    loaded: bool,
    entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EpgHealth {
    channels: usize,
    programs: usize,
    skipped: usize,
}

/// Health check response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    uptime: u64,
    classify_by: String,
    playlist: PlaylistHealth,
    epg: EpgHealth,
}

/// GET /health - what is currently published
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let playlist = state.loader.playlist().await;
    let epg = state.loader.epg().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        classify_by: format!("{:?}", state.config.classify_by),
        playlist: PlaylistHealth {
            loaded: playlist.is_some(),
            entries: playlist.as_ref().map(|p| p.entries.len()).unwrap_or(0),
            generation: playlist.as_ref().map(|p| p.generation),
        },
        epg: EpgHealth {
            channels: epg.channel_count(),
            programs: epg.program_count(),
            skipped: epg.skipped_count(),
        },
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                b"Internal Server Error".to_vec(),
            )
        }
    }
}

/// Readiness check (for Kubernetes). No external dependencies to wait on.
pub async fn ready() -> impl IntoResponse {
    (StatusCode::OK, "ready")
}

/// Liveness check (for Kubernetes)
pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}
