use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{bad_request, error_response, not_found, ApiError};
use crate::models::{
    ContentCategory, EntriesQuery, EntriesResponse, EntryView, LoadPlaylistRequest, LoadResponse,
};
use crate::services::loader::LoadOutcome;
use crate::AppState;

const NO_PLAYLIST: &str = "Nenhuma playlist carregada";

/// POST /api/playlist/load - Load a profile's playlist and its guide
///
/// Guide failures are reported in `epgError` without failing the request.
pub async fn load_playlist(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoadPlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let url = payload.url.trim();
    if url.is_empty() || !url.starts_with("http") {
        return Err(bad_request("URL inválida"));
    }
    if let Some(epg_url) = payload.epg_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        if !epg_url.starts_with("http") {
            return Err(bad_request("URL inválida"));
        }
    }

    let result = state
        .loader
        .load_profile(url, payload.epg_url.as_deref())
        .await
        .map_err(|e| error_response(&e))?;

    let loaded = match result.playlist {
        LoadOutcome::Published(loaded) => loaded,
        LoadOutcome::Superseded => {
            return Ok(Json(LoadResponse {
                status: "superseded".to_string(),
                generation: 0,
                stats: None,
                epg_url: None,
                epg_programs: None,
                epg_error: None,
            }))
        }
    };

    let (epg_programs, epg_error) = match &result.epg {
        Some(Ok(LoadOutcome::Published(index))) => (Some(index.program_count()), None),
        Some(Ok(LoadOutcome::Superseded)) | None => (None, None),
        Some(Err(e)) => (None, Some(e.user_message())),
    };

    Ok(Json(LoadResponse {
        status: "published".to_string(),
        generation: loaded.generation,
        stats: Some(loaded.stats.clone()),
        epg_url: result.epg_url,
        epg_programs,
        epg_error,
    }))
}

/// GET /api/playlist/entries - Paginated entries, optionally filtered by
/// category and exact group title
pub async fn get_entries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EntriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category: Option<ContentCategory> = match query.category.as_deref() {
        Some(raw) if !raw.trim().is_empty() => {
            Some(raw.parse().map_err(|e: String| bad_request(&e))?)
        }
        _ => None,
    };

    let playlist = state
        .loader
        .playlist()
        .await
        .ok_or_else(|| not_found(NO_PLAYLIST))?;

    let classifier = state.loader.classifier();
    let limit = query.limit.min(state.config.max_items_page);

    let filtered: Vec<EntryView> = playlist
        .entries
        .iter()
        .filter(|entry| {
            query
                .group
                .as_deref()
                .map_or(true, |group| entry.group_title == group)
        })
        .map(|entry| EntryView {
            entry: entry.clone(),
            category: classifier.classify(entry),
        })
        .filter(|view| category.map_or(true, |c| view.category == c))
        .collect();

    let total = filtered.len();
    let items: Vec<EntryView> = filtered.into_iter().skip(query.offset).take(limit).collect();
    let has_more = query.offset + items.len() < total;

    Ok(Json(EntriesResponse {
        items,
        total,
        limit,
        offset: query.offset,
        has_more,
    }))
}

/// GET /api/playlist/stats - Per-category counts of the loaded playlist
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let playlist = state
        .loader
        .playlist()
        .await
        .ok_or_else(|| not_found(NO_PLAYLIST))?;

    Ok(Json(playlist.stats.clone()))
}
