use serde::{Deserialize, Serialize};

/// Content classification of a playlist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Channel,
    Movie,
    Series,
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentCategory::Channel => write!(f, "channel"),
            ContentCategory::Movie => write!(f, "movie"),
            ContentCategory::Series => write!(f, "series"),
        }
    }
}

impl std::str::FromStr for ContentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "channel" | "live" => Ok(ContentCategory::Channel),
            "movie" | "vod" => Ok(ContentCategory::Movie),
            "series" => Ok(ContentCategory::Series),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// Single playlist entry (channel/movie/episode), in file order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub group_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvg_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvg_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvg_logo: Option<String>,
}

/// Output of one playlist parse
#[derive(Debug, Clone, Default)]
pub struct ParsedPlaylist {
    pub entries: Vec<PlaylistEntry>,
    /// From `x-tvg-url` (or `url-tvg`) on the `#EXTM3U` header
    pub epg_url: Option<String>,
}

/// Playlist statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStats {
    pub total_items: usize,
    pub channel_count: usize,
    pub movie_count: usize,
    pub series_count: usize,
    pub group_count: usize,
}

/// Request to load a playlist (profile selection)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPlaylistRequest {
    pub url: String,
    /// Overrides the guide URL discovered in the playlist header
    #[serde(default)]
    pub epg_url: Option<String>,
}

/// Request to (re)load the program guide
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadEpgRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Load response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub status: String,
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<PlaylistStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epg_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epg_programs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epg_error: Option<String>,
}

/// Entry with its derived category, as served to the UI
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    #[serde(flatten)]
    pub entry: PlaylistEntry,
    pub category: ContentCategory,
}

/// Paginated entries response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntriesResponse {
    pub items: Vec<EntryView>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// Query parameters for the entries endpoint
#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}
