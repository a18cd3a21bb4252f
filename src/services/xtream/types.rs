//! Xtream Codes API Types
//!
//! Typed records for the category/stream listings of the Player API, with
//! required-field validation at the boundary. Panels are loose about JSON
//! types (ids arrive as numbers or strings), so ids are normalized here.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// Extracted credentials from a playlist URL
#[derive(Debug, Clone, PartialEq)]
pub struct XtreamCredentials {
    /// Server base URL (e.g., "http://example.com:8080")
    pub server: String,
    pub username: String,
    pub password: String,
}

impl XtreamCredentials {
    fn query(&self) -> String {
        format!(
            "username={}&password={}",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password)
        )
    }

    /// Build the player_api.php base URL
    pub fn api_url(&self) -> String {
        format!("{}/player_api.php?{}", self.server, self.query())
    }

    /// Full M3U playlist URL
    pub fn playlist_url(&self) -> String {
        format!("{}/get.php?{}&type=m3u_plus&output=ts", self.server, self.query())
    }

    /// Build EPG XML URL
    pub fn epg_url(&self) -> String {
        format!("{}/xmltv.php?{}", self.server, self.query())
    }
}

/// The three URLs a panel exposes for one account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XtreamUrls {
    pub m3u: String,
    pub epg: String,
    pub api: String,
}

/// Build panel URLs from a host and account, tolerating a trailing slash
pub fn build_urls(host: &str, username: &str, password: &str) -> XtreamUrls {
    let creds = XtreamCredentials {
        server: host.trim_end_matches('/').to_string(),
        username: username.to_string(),
        password: password.to_string(),
    };

    XtreamUrls {
        m3u: creds.playlist_url(),
        epg: creds.epg_url(),
        api: creds.api_url(),
    }
}

// ============================================================================
// Lenient scalar helpers
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

fn id_as_i64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    match NumOrString::deserialize(deserializer)? {
        NumOrString::Int(n) => Ok(n),
        NumOrString::Float(f) if f.fract() == 0.0 => Ok(f as i64),
        NumOrString::Float(f) => Err(de::Error::custom(format!("non-integer id {}", f))),
        NumOrString::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid id '{}'", s))),
    }
}

fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match NumOrString::deserialize(deserializer)? {
        NumOrString::Int(n) => Ok(n.to_string()),
        NumOrString::Float(f) => Ok(f.to_string()),
        NumOrString::Str(s) => Ok(s),
    }
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    Ok(match Option::<NumOrString>::deserialize(deserializer)? {
        Some(NumOrString::Int(n)) => n,
        Some(NumOrString::Float(f)) => f as i64,
        Some(NumOrString::Str(s)) => s.trim().parse().unwrap_or(0),
        None => 0,
    })
}

fn lenient_f32<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<f32>, D::Error> {
    Ok(match Option::<NumOrString>::deserialize(deserializer)? {
        Some(NumOrString::Int(n)) => Some(n as f32),
        Some(NumOrString::Float(f)) => Some(f as f32),
        Some(NumOrString::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}

// ============================================================================
// Records
// ============================================================================

/// Required-field checks beyond what serde enforces
pub trait ApiRecord {
    fn validate(&self) -> std::result::Result<(), String>;
}

/// Live/VOD/series category
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LiveCategory {
    #[serde(deserialize_with = "id_as_string")]
    pub category_id: String,
    pub category_name: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub parent_id: i64,
}

impl ApiRecord for LiveCategory {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.category_id.trim().is_empty() {
            return Err("category_id is empty".to_string());
        }
        if self.category_name.trim().is_empty() {
            return Err(format!("category {} has no name", self.category_id));
        }
        Ok(())
    }
}

/// VOD (movie) listing item
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VodItem {
    #[serde(deserialize_with = "id_as_i64")]
    pub stream_id: i64,
    pub name: String,
    #[serde(default)]
    pub stream_icon: Option<String>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub rating_5based: Option<f32>,
    #[serde(default)]
    pub container_extension: Option<String>,
}

impl ApiRecord for VodItem {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("stream {} has no name", self.stream_id));
        }
        Ok(())
    }
}

/// Series listing item
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SeriesItem {
    #[serde(deserialize_with = "id_as_i64")]
    pub series_id: i64,
    pub name: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub rating_5based: Option<f32>,
}

impl ApiRecord for SeriesItem {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("series {} has no name", self.series_id));
        }
        Ok(())
    }
}

/// Decode and validate a listing returned by `endpoint`.
/// Fails fast on the first invalid record.
pub fn decode_list<T>(endpoint: &str, body: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned + ApiRecord,
{
    let malformed = |reason: String| IngestError::MalformedApiResponse {
        endpoint: endpoint.to_string(),
        reason,
    };

    let trimmed = body.trim();
    // Some panels answer "null" or nothing for empty categories
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('<') {
        return Err(malformed("server returned HTML instead of JSON".to_string()));
    }

    let items: Vec<T> = serde_json::from_str(trimmed).map_err(|e| malformed(e.to_string()))?;

    for (i, item) in items.iter().enumerate() {
        item.validate()
            .map_err(|reason| malformed(format!("item {}: {}", i, reason)))?;
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_url_builders() {
        let creds = XtreamCredentials {
            server: "http://example.com:8080".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
        };

        assert_eq!(
            creds.api_url(),
            "http://example.com:8080/player_api.php?username=user&password=pass"
        );
        assert_eq!(
            creds.epg_url(),
            "http://example.com:8080/xmltv.php?username=user&password=pass"
        );
        assert_eq!(
            creds.playlist_url(),
            "http://example.com:8080/get.php?username=user&password=pass&type=m3u_plus&output=ts"
        );
    }

    #[test]
    fn test_build_urls_trailing_slash() {
        let urls = build_urls("http://panel.tv:80/", "ana", "s3nha");

        assert_eq!(
            urls.m3u,
            "http://panel.tv:80/get.php?username=ana&password=s3nha&type=m3u_plus&output=ts"
        );
        assert_eq!(urls.epg, "http://panel.tv:80/xmltv.php?username=ana&password=s3nha");
        assert_eq!(urls.api, "http://panel.tv:80/player_api.php?username=ana&password=s3nha");
    }

    #[test]
    fn test_decode_categories_with_mixed_id_types() {
        let body = r#"[
            {"category_id": "12", "category_name": "Filmes", "parent_id": 0},
            {"category_id": 13, "category_name": "Séries", "parent_id": "2"}
        ]"#;
        let categories: Vec<LiveCategory> = decode_list("get_vod_categories", body).unwrap();

        assert_eq!(categories[0].category_id, "12");
        assert_eq!(categories[1].category_id, "13");
        assert_eq!(categories[1].parent_id, 2);
    }

    #[test]
    fn test_decode_vod_items() {
        let body = r#"[{"stream_id": "101", "name": "Duna", "stream_icon": "http://i/d.jpg", "rating_5based": "4.5"}]"#;
        let items: Vec<VodItem> = decode_list("get_vod_streams", body).unwrap();

        assert_eq!(items[0].stream_id, 101);
        assert_eq!(items[0].rating_5based, Some(4.5));
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let body = r#"[{"series_id": 7, "cover": "http://i/c.jpg"}]"#;
        let err = decode_list::<SeriesItem>("get_series", body).unwrap_err();
        assert!(matches!(err, IngestError::MalformedApiResponse { .. }));

        let body = r#"[{"series_id": 7, "name": "  "}]"#;
        let err = decode_list::<SeriesItem>("get_series", body).unwrap_err();
        assert!(err.to_string().contains("item 0"));
    }

    #[test]
    fn test_non_list_responses() {
        assert!(decode_list::<VodItem>("get_vod_streams", "").unwrap().is_empty());
        assert!(decode_list::<VodItem>("get_vod_streams", "null").unwrap().is_empty());
        assert!(decode_list::<VodItem>("get_vod_streams", "[]").unwrap().is_empty());

        let err = decode_list::<VodItem>("get_vod_streams", "<html>403</html>").unwrap_err();
        assert!(matches!(err, IngestError::MalformedApiResponse { .. }));

        let err = decode_list::<VodItem>("get_vod_streams", r#"{"user_info":{"auth":0}}"#).unwrap_err();
        assert!(matches!(err, IngestError::MalformedApiResponse { .. }));
    }
}
