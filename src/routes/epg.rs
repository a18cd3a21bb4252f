use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::{bad_request, error_response, ApiError};
use crate::models::{EpgLoadResponse, LoadEpgRequest, NowNextQuery, NowNextResponse};
use crate::services::loader::LoadOutcome;
use crate::AppState;

/// POST /api/epg/load - Replace the guide; no URL clears it
pub async fn load_epg(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<LoadEpgRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = payload.map(|Json(p)| p).unwrap_or_default();

    if let Some(url) = request.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        if !url.starts_with("http") {
            return Err(bad_request("URL inválida"));
        }
    }

    let outcome = state
        .loader
        .load_epg(request.url.as_deref())
        .await
        .map_err(|e| error_response(&e))?;

    let response = match outcome {
        LoadOutcome::Published(index) => EpgLoadResponse {
            status: "published".to_string(),
            channels: index.channel_count(),
            programs: index.program_count(),
            skipped: index.skipped_count(),
        },
        LoadOutcome::Superseded => EpgLoadResponse {
            status: "superseded".to_string(),
            channels: 0,
            programs: 0,
            skipped: 0,
        },
    };

    Ok(Json(response))
}

/// GET /api/epg/:channel_id/now - Current and next programme
pub async fn now_next(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Query(query): Query<NowNextQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let now = match query.at.as_deref() {
        Some(at) => DateTime::parse_from_rfc3339(at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| bad_request("Parâmetro 'at' inválido (use RFC 3339)"))?,
        None => Utc::now(),
    };

    let index = state.loader.epg().await;
    let now_next = index.program_for_channel(&channel_id, now);

    Ok(Json(NowNextResponse {
        current: now_next.current.cloned(),
        next: now_next.next.cloned(),
        channel_id,
        refresh_after_secs: state.config.now_next_refresh_secs,
    }))
}

/// DELETE /api/session - Logout: drop the playlist and guide
pub async fn reset_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.loader.reset().await;
    Json(serde_json::json!({ "status": "reset" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{get_request, json_body, post_json, send, serve_files, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    const GUIDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tv>
  <programme channel="globo.br" start="20250813180000 -0300" stop="20250813190000 -0300">
    <title>Jornal Hoje</title>
    <desc>Notícias &amp; esportes</desc>
  </programme>
  <programme channel="globo.br" start="20250813190000 -0300" stop="20250813200000 -0300">
    <title>Novela</title>
  </programme>
  <programme channel="globo.br" start="garbage" stop="20250813200000 -0300">
    <title>Sem data</title>
  </programme>
</tv>"#;

    #[tokio::test]
    async fn test_load_and_query_now_next() {
        let base = serve_files(&[("/guide.xml", GUIDE)]).await;
        let state = test_state();

        let response = send(
            &state,
            post_json("/api/epg/load", serde_json::json!({ "url": format!("{}/guide.xml", base) })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["programs"], 2);
        assert_eq!(body["skipped"], 1);

        // 18:30 in Brasília is 21:30Z
        let body = json_body(
            send(&state, get_request("/api/epg/GLOBO.BR/now?at=2025-08-13T21:30:00Z")).await,
        )
        .await;
        assert_eq!(body["current"]["title"], "Jornal Hoje");
        assert_eq!(body["current"]["description"], "Notícias & esportes");
        assert_eq!(body["next"]["title"], "Novela");
        assert_eq!(body["refreshAfterSecs"], 60);
        assert_eq!(body["channelId"], "GLOBO.BR");
    }

    #[tokio::test]
    async fn test_unknown_channel_is_empty_not_error() {
        let state = test_state();
        let response = send(&state, get_request("/api/epg/cnn/now")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert!(body["current"].is_null());
        assert!(body["next"].is_null());
    }

    #[tokio::test]
    async fn test_bad_instant_is_rejected() {
        let state = test_state();
        let response = send(&state, get_request("/api/epg/cnn/now?at=ontem")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_broken_guide_is_unprocessable_and_clears() {
        let base = serve_files(&[
            ("/guide.xml", GUIDE),
            ("/broken.xml", "<tv><programme channel=\"a\"><title>x</title>"),
        ])
        .await;
        let state = test_state();

        state
            .loader
            .load_epg(Some(&format!("{}/guide.xml", base)))
            .await
            .unwrap();

        let response = send(
            &state,
            post_json("/api/epg/load", serde_json::json!({ "url": format!("{}/broken.xml", base) })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["kind"], "xml_structure");
        assert!(state.loader.epg().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_without_url_clears_guide() {
        let base = serve_files(&[("/guide.xml", GUIDE)]).await;
        let state = test_state();
        state
            .loader
            .load_epg(Some(&format!("{}/guide.xml", base)))
            .await
            .unwrap();

        let response = send(&state, post_json("/api/epg/load", serde_json::json!({}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["programs"], 0);
        assert!(state.loader.epg().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_session() {
        let base = serve_files(&[("/guide.xml", GUIDE)]).await;
        let state = test_state();
        state
            .loader
            .load_epg(Some(&format!("{}/guide.xml", base)))
            .await
            .unwrap();

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/session")
            .body(Body::empty())
            .unwrap();
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.loader.epg().await.is_empty());
        assert!(state.loader.playlist().await.is_none());
    }
}
