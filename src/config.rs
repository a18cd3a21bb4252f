use std::env;

use crate::services::classifier::{
    ClassificationSignal, ContentClassifier, DEFAULT_MOVIE_KEYWORDS, DEFAULT_SERIES_KEYWORDS,
};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub node_env: String,

    // Fetching
    pub user_agent: String,
    pub fetch_timeout_ms: u64,
    pub max_retries: u32,
    pub max_m3u_size_mb: usize,
    pub max_epg_size_mb: usize,

    // Classification
    pub classify_by: ClassificationSignal,
    pub movie_keywords: Vec<String>,
    pub series_keywords: Vec<String>,

    // Presentation
    pub now_next_refresh_secs: u64,
    pub max_items_page: usize,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Comma-separated list, falling back to `default` when unset or empty
fn keyword_list(value: Option<String>, default: &[&str]) -> Vec<String> {
    let words: Vec<String> = value
        .unwrap_or_default()
        .split(',')
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        words
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let classify_by = match env::var("CLASSIFY_BY") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to url", e);
                ClassificationSignal::UrlPath
            }),
            Err(_) => ClassificationSignal::UrlPath,
        };

        Self {
            port: env_or("PORT", 3001),
            node_env: env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string()),

            // Use VLC user agent to avoid IPTV server blocks
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| "VLC/3.0.18 LibVLC/3.0.18".to_string()),
            fetch_timeout_ms: env_or("FETCH_TIMEOUT_MS", 300_000), // 5 minutes
            max_retries: env_or("MAX_RETRIES", 3),
            max_m3u_size_mb: env_or("MAX_M3U_SIZE_MB", 500),
            max_epg_size_mb: env_or("MAX_EPG_SIZE_MB", 500),

            classify_by,
            movie_keywords: keyword_list(env::var("MOVIE_KEYWORDS").ok(), DEFAULT_MOVIE_KEYWORDS),
            series_keywords: keyword_list(
                env::var("SERIES_KEYWORDS").ok(),
                DEFAULT_SERIES_KEYWORDS,
            ),

            now_next_refresh_secs: env_or("NOW_NEXT_REFRESH_SECS", 60),
            max_items_page: env_or("MAX_ITEMS_PAGE", 5000),
        }
    }

    /// Classifier for the configured signal and keyword sets
    pub fn classifier(&self) -> ContentClassifier {
        ContentClassifier::with_keywords(
            self.classify_by,
            self.movie_keywords.clone(),
            self.series_keywords.clone(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            node_env: "development".to_string(),
            user_agent: "VLC/3.0.18 LibVLC/3.0.18".to_string(),
            fetch_timeout_ms: 300_000,
            max_retries: 3,
            max_m3u_size_mb: 500,
            max_epg_size_mb: 500,
            classify_by: ClassificationSignal::UrlPath,
            movie_keywords: keyword_list(None, DEFAULT_MOVIE_KEYWORDS),
            series_keywords: keyword_list(None, DEFAULT_SERIES_KEYWORDS),
            now_next_refresh_secs: 60,
            max_items_page: 5000,
        }
    }
}
