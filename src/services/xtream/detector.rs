//! Xtream Codes URL Detection
//!
//! Recognizes panel playlist URLs and derives the sibling endpoints
//! (guide, Player API) from their credentials. No network access.

use std::collections::HashMap;
use tracing::debug;
use url::Url;

use super::types::XtreamCredentials;

/// Extract Xtream credentials from a playlist URL
///
/// Any path carrying both `username` and `password` query parameters
/// qualifies; panels serve playlists from `get.php` but also from custom
/// paths behind reverse proxies.
///
/// # Returns
/// - `Some(XtreamCredentials)` if both parameters are present and non-empty
/// - `None` otherwise
pub fn extract_credentials(playlist_url: &str) -> Option<XtreamCredentials> {
    let parsed = match Url::parse(playlist_url) {
        Ok(url) => url,
        Err(e) => {
            debug!("Failed to parse URL: {}", e);
            return None;
        }
    };

    let params: HashMap<_, _> = parsed.query_pairs().collect();

    let username = params.get("username")?.trim().to_string();
    let password = params.get("password")?.trim().to_string();

    if username.is_empty() || password.is_empty() {
        debug!("Empty username or password in URL");
        return None;
    }

    let host = parsed.host_str()?;
    let port_suffix = parsed
        .port()
        .map(|p| format!(":{}", p))
        .unwrap_or_default();

    let server = format!("{}://{}{}", parsed.scheme(), host, port_suffix);

    debug!("Extracted Xtream credentials: server={}, username={}", server, username);

    Some(XtreamCredentials {
        server,
        username,
        password,
    })
}

/// Guide URL for a playlist served by an Xtream panel
pub fn derive_epg_url(playlist_url: &str) -> Option<String> {
    extract_credentials(playlist_url).map(|creds| creds.epg_url())
}
