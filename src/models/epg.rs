use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single programme from the XMLTV guide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    /// Channel id as written in the guide (matches `tvg-id`, case-insensitive)
    pub channel_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

impl Program {
    /// `start <= now < stop`
    pub fn is_airing(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.stop
    }
}

/// Current and following programme for a channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NowNext<'a> {
    pub current: Option<&'a Program>,
    pub next: Option<&'a Program>,
}

/// Now/next response with the polling hint for the UI
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowNextResponse {
    pub channel_id: String,
    pub current: Option<Program>,
    pub next: Option<Program>,
    pub refresh_after_secs: u64,
}

/// Query parameters for the now/next endpoint
#[derive(Debug, Default, Deserialize)]
pub struct NowNextQuery {
    /// RFC 3339 instant; defaults to the current time
    #[serde(default)]
    pub at: Option<String>,
}

/// Guide load response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpgLoadResponse {
    pub status: String,
    pub channels: usize,
    pub programs: usize,
    pub skipped: usize,
}
