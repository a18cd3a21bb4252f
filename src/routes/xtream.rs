use axum::{extract::Path, response::IntoResponse, Json};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{bad_request, error_response, ApiError};
use crate::services::xtream::{
    build_urls, decode_list, ApiRecord, LiveCategory, SeriesItem, VodItem,
};

/// Panel account as typed in the login screen
#[derive(Debug, Deserialize)]
pub struct PanelAccount {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// POST /api/xtream/urls - Playlist, guide and API URLs for a panel account
pub async fn panel_urls(Json(account): Json<PanelAccount>) -> Result<impl IntoResponse, ApiError> {
    let host = account.host.trim();
    if !host.starts_with("http") {
        return Err(bad_request("URL inválida"));
    }
    if account.username.trim().is_empty() || account.password.trim().is_empty() {
        return Err(bad_request("Usuário e senha são obrigatórios"));
    }

    Ok(Json(build_urls(
        host,
        account.username.trim(),
        account.password.trim(),
    )))
}

fn decoded<T>(endpoint: &str, body: &str) -> Result<serde_json::Value, ApiError>
where
    T: DeserializeOwned + ApiRecord + Serialize,
{
    let items = decode_list::<T>(endpoint, body).map_err(|e| error_response(&e))?;
    Ok(serde_json::json!({
        "endpoint": endpoint,
        "count": items.len(),
        "items": items,
    }))
}

/// POST /api/xtream/validate/:kind - Validate a Player API listing body
///
/// `kind` is the action without the `get_` prefix: `live_categories`,
/// `vod_categories`, `series_categories`, `vod_streams` or `series`.
pub async fn validate_listing(
    Path(kind): Path<String>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let endpoint = format!("get_{}", kind);

    let value = match kind.as_str() {
        "live_categories" | "vod_categories" | "series_categories" => {
            decoded::<LiveCategory>(&endpoint, &body)?
        }
        "vod_streams" => decoded::<VodItem>(&endpoint, &body)?,
        "series" => decoded::<SeriesItem>(&endpoint, &body)?,
        _ => return Err(bad_request("Tipo de listagem desconhecido")),
    };

    Ok(Json(value))
}
