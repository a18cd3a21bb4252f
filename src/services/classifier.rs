use crate::models::{ContentCategory, PlaylistEntry, PlaylistStats};
use std::collections::HashSet;

/// Default group-title keywords for movies
pub const DEFAULT_MOVIE_KEYWORDS: &[&str] = &["filme", "movie"];
/// Default group-title keywords for series
pub const DEFAULT_SERIES_KEYWORDS: &[&str] = &["série", "series", "serie"];

/// Which part of an entry drives classification.
///
/// The two heuristics can disagree on the same entry, so a deployment picks
/// one and every entry is classified with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassificationSignal {
    /// `/movie/` and `/series/` path segments of the stream URL
    #[default]
    UrlPath,
    /// Keywords in the group title
    GroupTitle,
}

impl std::str::FromStr for ClassificationSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "url" | "url_path" | "path" => Ok(ClassificationSignal::UrlPath),
            "group" | "group_title" => Ok(ClassificationSignal::GroupTitle),
            other => Err(format!("unknown classification signal '{}'", other)),
        }
    }
}

/// Content classifier for playlist entries
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    signal: ClassificationSignal,
    movie_keywords: Vec<String>,
    series_keywords: Vec<String>,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new(ClassificationSignal::default())
    }
}

impl ContentClassifier {
    /// Classifier with the default keyword sets
    pub fn new(signal: ClassificationSignal) -> Self {
        Self::with_keywords(
            signal,
            DEFAULT_MOVIE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_SERIES_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn with_keywords(
        signal: ClassificationSignal,
        movie_keywords: Vec<String>,
        series_keywords: Vec<String>,
    ) -> Self {
        let normalize = |words: Vec<String>| -> Vec<String> {
            words
                .into_iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };

        Self {
            signal,
            movie_keywords: normalize(movie_keywords),
            series_keywords: normalize(series_keywords),
        }
    }

    pub fn signal(&self) -> ClassificationSignal {
        self.signal
    }

    /// Main classification method, using the configured signal
    pub fn classify(&self, entry: &PlaylistEntry) -> ContentCategory {
        match self.signal {
            ClassificationSignal::UrlPath => Self::classify_by_url(&entry.url),
            ClassificationSignal::GroupTitle => self.classify_by_group(&entry.group_title),
        }
    }

    /// Classify based on the stream URL path
    pub fn classify_by_url(url: &str) -> ContentCategory {
        let lower_url = url.to_lowercase();

        if lower_url.contains("/movie/") {
            ContentCategory::Movie
        } else if lower_url.contains("/series/") {
            ContentCategory::Series
        } else {
            ContentCategory::Channel
        }
    }

    /// Classify based on group name
    pub fn classify_by_group(&self, group: &str) -> ContentCategory {
        if group.is_empty() {
            return ContentCategory::Channel;
        }

        let lower_group = group.to_lowercase();

        // Series first ("Séries | Filmes Clássicos" is a series shelf)
        if self.series_keywords.iter().any(|k| lower_group.contains(k.as_str())) {
            return ContentCategory::Series;
        }

        if self.movie_keywords.iter().any(|k| lower_group.contains(k.as_str())) {
            return ContentCategory::Movie;
        }

        ContentCategory::Channel
    }

    /// Per-category counts over a playlist
    pub fn stats(&self, entries: &[PlaylistEntry]) -> PlaylistStats {
        let mut stats = PlaylistStats::default();
        let mut groups: HashSet<&str> = HashSet::new();

        for entry in entries {
            stats.total_items += 1;
            match self.classify(entry) {
                ContentCategory::Channel => stats.channel_count += 1,
                ContentCategory::Movie => stats.movie_count += 1,
                ContentCategory::Series => stats.series_count += 1,
            }
            groups.insert(entry.group_title.as_str());
        }

        stats.group_count = groups.len();
        stats
    }
}
