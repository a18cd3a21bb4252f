//! Xtream Codes Integration
//!
//! Xtream Codes is a popular IPTV management system. Playlists served by a
//! panel follow this pattern:
//! ```text
//! http://server:port/get.php?username=X&password=Y&type=m3u_plus&output=ts
//! ```
//!
//! From the same credentials the panel also serves the guide
//! (`xmltv.php`) and the Player API (`player_api.php`). This module only
//! builds those URLs and validates API records; it performs no requests.

pub mod detector;
pub mod types;

pub use detector::{derive_epg_url, extract_credentials};
pub use types::{
    build_urls, decode_list, ApiRecord, LiveCategory, SeriesItem, VodItem, XtreamCredentials,
    XtreamUrls,
};
