//! Load orchestration: fetch, parse, publish.
//!
//! Each pipeline (playlist, guide) owns one slot holding the current
//! snapshot. Loads build their result off to the side and swap it in only if
//! no newer load was requested meanwhile.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{PlaylistEntry, PlaylistStats};
use crate::services::classifier::ContentClassifier;
use crate::services::fetcher::Fetcher;
use crate::services::m3u_parser::{parse_playlist, rewrite_playlist_url};
use crate::services::metrics::{self, PIPELINE_EPG, PIPELINE_PLAYLIST};
use crate::services::xmltv::{parse_xmltv_bytes, ProgramIndex};
use crate::services::xtream::derive_epg_url;

/// Published playlist snapshot
#[derive(Debug, Clone)]
pub struct LoadedPlaylist {
    pub source_url: String,
    pub entries: Vec<PlaylistEntry>,
    pub epg_url: Option<String>,
    pub stats: PlaylistStats,
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
}

/// Result of a load that did not fail
#[derive(Debug, Clone)]
pub enum LoadOutcome<T> {
    /// The value is now the published snapshot
    Published(T),
    /// A newer load was requested; this result was discarded
    Superseded,
}

impl<T> LoadOutcome<T> {
    pub fn published(&self) -> Option<&T> {
        match self {
            LoadOutcome::Published(value) => Some(value),
            LoadOutcome::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, LoadOutcome::Superseded)
    }
}

/// Playlist plus guide load for one profile
#[derive(Debug)]
pub struct ProfileLoad {
    pub playlist: LoadOutcome<Arc<LoadedPlaylist>>,
    /// Guide URL that was used, if any
    pub epg_url: Option<String>,
    /// Guide result; `None` only when the playlist load was superseded.
    /// Without a guide URL this is the result of clearing the guide.
    pub epg: Option<Result<LoadOutcome<Arc<ProgramIndex>>>>,
}

/// Owner of the published playlist and guide
pub struct IngestLoader<F: Fetcher> {
    playlist_fetcher: F,
    epg_fetcher: F,
    classifier: ContentClassifier,
    playlist_generation: AtomicU64,
    epg_generation: AtomicU64,
    playlist: RwLock<Option<Arc<LoadedPlaylist>>>,
    epg: RwLock<Arc<ProgramIndex>>,
}

impl<F: Fetcher> IngestLoader<F> {
    pub fn new(playlist_fetcher: F, epg_fetcher: F, classifier: ContentClassifier) -> Self {
        Self {
            playlist_fetcher,
            epg_fetcher,
            classifier,
            playlist_generation: AtomicU64::new(0),
            epg_generation: AtomicU64::new(0),
            playlist: RwLock::new(None),
            epg: RwLock::new(Arc::new(ProgramIndex::new())),
        }
    }

    pub fn classifier(&self) -> &ContentClassifier {
        &self.classifier
    }

    /// Current playlist snapshot
    pub async fn playlist(&self) -> Option<Arc<LoadedPlaylist>> {
        self.playlist.read().await.clone()
    }

    /// Current guide index (empty when no guide is loaded)
    pub async fn epg(&self) -> Arc<ProgramIndex> {
        self.epg.read().await.clone()
    }

    /// Fetch, parse and publish a playlist.
    ///
    /// On failure the published playlist is cleared, unless a newer load has
    /// been requested in the meantime.
    pub async fn load_playlist(&self, url: &str) -> Result<LoadOutcome<Arc<LoadedPlaylist>>> {
        let generation = self.playlist_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.load_playlist_as(url, generation).await
    }

    async fn load_playlist_as(
        &self,
        url: &str,
        generation: u64,
    ) -> Result<LoadOutcome<Arc<LoadedPlaylist>>> {
        let fetch_url = rewrite_playlist_url(url);
        info!("Loading playlist (generation {}): {}", generation, fetch_url);

        match self.build_playlist(&fetch_url, generation).await {
            Ok(loaded) => {
                let loaded = Arc::new(loaded);
                let mut slot = self.playlist.write().await;
                if !self.is_latest(&self.playlist_generation, generation) {
                    debug!("Discarding superseded playlist load {}", generation);
                    metrics::record_load(PIPELINE_PLAYLIST, "superseded");
                    return Ok(LoadOutcome::Superseded);
                }

                *slot = Some(loaded.clone());
                metrics::PLAYLIST_ENTRIES.set(loaded.entries.len() as i64);
                metrics::record_load(PIPELINE_PLAYLIST, "published");
                info!(
                    "Playlist published: {} entries ({} channels, {} movies, {} series)",
                    loaded.stats.total_items,
                    loaded.stats.channel_count,
                    loaded.stats.movie_count,
                    loaded.stats.series_count
                );
                Ok(LoadOutcome::Published(loaded))
            }
            Err(e) => {
                let mut slot = self.playlist.write().await;
                if self.is_latest(&self.playlist_generation, generation) {
                    *slot = None;
                    metrics::PLAYLIST_ENTRIES.set(0);
                }
                warn!("Playlist load failed: {}", e);
                metrics::record_load(PIPELINE_PLAYLIST, e.kind());
                Err(e)
            }
        }
    }

    async fn build_playlist(&self, url: &str, generation: u64) -> Result<LoadedPlaylist> {
        let bytes = self.playlist_fetcher.fetch_bytes(url).await?;
        let text = String::from_utf8_lossy(&bytes);
        let parsed = parse_playlist(&text)?;
        let stats = self.classifier.stats(&parsed.entries);

        Ok(LoadedPlaylist {
            source_url: url.to_string(),
            entries: parsed.entries,
            epg_url: parsed.epg_url,
            stats,
            generation,
            loaded_at: Utc::now(),
        })
    }

    /// Fetch, parse and publish a guide. `None` clears the guide.
    ///
    /// A failed load that is still the latest leaves an empty index.
    pub async fn load_epg(&self, url: Option<&str>) -> Result<LoadOutcome<Arc<ProgramIndex>>> {
        let generation = self.epg_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let url = match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => url,
            None => {
                let empty = Arc::new(ProgramIndex::new());
                let mut slot = self.epg.write().await;
                if !self.is_latest(&self.epg_generation, generation) {
                    return Ok(LoadOutcome::Superseded);
                }
                *slot = empty.clone();
                metrics::EPG_PROGRAMMES.set(0);
                debug!("Guide cleared (no URL)");
                return Ok(LoadOutcome::Published(empty));
            }
        };

        info!("Loading EPG (generation {}): {}", generation, url);

        let result = match self.epg_fetcher.fetch_bytes(url).await {
            Ok(bytes) => parse_xmltv_bytes(&bytes),
            Err(e) => Err(e),
        };

        match result {
            Ok(index) => {
                let index = Arc::new(index);
                let mut slot = self.epg.write().await;
                if !self.is_latest(&self.epg_generation, generation) {
                    debug!("Discarding superseded EPG load {}", generation);
                    metrics::record_load(PIPELINE_EPG, "superseded");
                    return Ok(LoadOutcome::Superseded);
                }

                *slot = index.clone();
                metrics::EPG_PROGRAMMES.set(index.program_count() as i64);
                metrics::EPG_SKIPPED_PROGRAMMES.inc_by(index.skipped_count() as u64);
                metrics::record_load(PIPELINE_EPG, "published");
                info!(
                    "EPG published: {} programmes across {} channels",
                    index.program_count(),
                    index.channel_count()
                );
                Ok(LoadOutcome::Published(index))
            }
            Err(e) => {
                let mut slot = self.epg.write().await;
                if self.is_latest(&self.epg_generation, generation) {
                    *slot = Arc::new(ProgramIndex::new());
                    metrics::EPG_PROGRAMMES.set(0);
                }
                warn!("EPG load failed: {}", e);
                metrics::record_load(PIPELINE_EPG, e.kind());
                Err(e)
            }
        }
    }

    /// Load a profile's playlist, then its guide.
    ///
    /// Guide source: `epg_override`, else the playlist header URL, else the
    /// panel's `xmltv.php` when the playlist URL carries Xtream credentials.
    /// Without any of those the previous guide is cleared. A guide failure
    /// does not fail the profile load; a playlist failure clears the guide
    /// too, unless a newer playlist load was requested meanwhile.
    pub async fn load_profile(&self, url: &str, epg_override: Option<&str>) -> Result<ProfileLoad> {
        let generation = self.playlist_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let playlist = match self.load_playlist_as(url, generation).await {
            Ok(playlist) => playlist,
            Err(e) => {
                if self.is_latest(&self.playlist_generation, generation) {
                    // Result ignored: the playlist error is what the caller needs
                    let _ = self.load_epg(None).await;
                }
                return Err(e);
            }
        };

        let header_epg_url = match &playlist {
            LoadOutcome::Published(loaded) => loaded.epg_url.clone(),
            LoadOutcome::Superseded => {
                return Ok(ProfileLoad {
                    playlist: LoadOutcome::Superseded,
                    epg_url: None,
                    epg: None,
                })
            }
        };

        let epg_url = epg_override
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| u.to_string())
            .or(header_epg_url)
            .or_else(|| derive_epg_url(url));

        if epg_url.is_none() {
            debug!("No guide URL for this playlist, clearing guide");
        }
        let epg = Some(self.load_epg(epg_url.as_deref()).await);

        Ok(ProfileLoad {
            playlist,
            epg_url,
            epg,
        })
    }

    /// Logout: discard in-flight loads and clear both slots
    pub async fn reset(&self) {
        self.playlist_generation.fetch_add(1, Ordering::SeqCst);
        self.epg_generation.fetch_add(1, Ordering::SeqCst);

        *self.playlist.write().await = None;
        *self.epg.write().await = Arc::new(ProgramIndex::new());

        metrics::PLAYLIST_ENTRIES.set(0);
        metrics::EPG_PROGRAMMES.set(0);
        info!("Ingestion state reset");
    }

    fn is_latest(&self, counter: &AtomicU64, generation: u64) -> bool {
        counter.load(Ordering::SeqCst) == generation
    }
}
