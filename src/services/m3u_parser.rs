use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::error::{IngestError, Result};
use crate::models::{ParsedPlaylist, PlaylistEntry};

/// Playlist header directive
const HEADER_TOKEN: &str = "#EXTM3U";
/// Entry descriptor directive
const EXTINF_TOKEN: &str = "#EXTINF:";
/// Name used when neither the trailing title nor `tvg-name` is present
pub const UNKNOWN_TITLE: &str = "Título Desconhecido";

lazy_static! {
    /// Regex to parse EXTINF attributes (tvg-id="...", group-title="...", etc)
    static ref ATTR_REGEX: Regex = Regex::new(r#"([A-Za-z0-9_]+(?:-[A-Za-z0-9_]+)*)="([^"]*)""#).unwrap();

    /// Regex to extract duration from EXTINF line
    static ref DURATION_REGEX: Regex = Regex::new(r"^-?\d+").unwrap();
}

/// Parsed EXTINF line data
#[derive(Debug, Default, PartialEq)]
pub struct ExtinfData {
    pub duration: i32,
    /// Lowercased attribute name -> value, first occurrence wins
    pub attributes: HashMap<String, String>,
    /// Trimmed text after the last comma, if the line has one
    pub title: Option<String>,
}

impl ExtinfData {
    /// Non-empty attribute value
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Trailing title, then `tvg-name`, then the placeholder
    pub fn display_name(&self) -> String {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.attribute("tvg-name"))
            .unwrap_or(UNKNOWN_TITLE)
            .to_string()
    }

    fn into_entry(self, url: &str) -> PlaylistEntry {
        let name = self.display_name();
        let owned = |key: &str| self.attribute(key).map(|s| s.to_string());
        let tvg_logo = owned("tvg-logo");

        PlaylistEntry {
            name,
            url: url.to_string(),
            logo_url: tvg_logo.clone(),
            group_title: owned("group-title").unwrap_or_default(),
            tvg_id: owned("tvg-id"),
            tvg_name: owned("tvg-name"),
            tvg_logo,
        }
    }
}

/// Extract a quoted attribute (`name="value"`) from a directive line.
/// Matching on the name is case-insensitive; returns the first match.
pub fn get_attribute(line: &str, name: &str) -> Option<String> {
    ATTR_REGEX
        .captures_iter(line)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .map(|caps| caps[2].to_string())
}

/// Parse an EXTINF line
/// Format: #EXTINF:duration tvg-id="..." tvg-name="..." tvg-logo="..." group-title="...",Title
pub fn parse_extinf(line: &str) -> Option<ExtinfData> {
    let content = line.strip_prefix(EXTINF_TOKEN)?;

    let duration = DURATION_REGEX
        .find(content.trim_start())
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(-1);

    // Attributes may contain commas, so scan the whole line
    let mut attributes = HashMap::new();
    for caps in ATTR_REGEX.captures_iter(content) {
        attributes
            .entry(caps[1].to_lowercase())
            .or_insert_with(|| caps[2].to_string());
    }

    let title = content
        .rsplit_once(',')
        .map(|(_, title)| title.trim().to_string());

    Some(ExtinfData {
        duration,
        attributes,
        title,
    })
}

/// EPG URL from a header line: `x-tvg-url`, then the `url-tvg` alias
fn header_epg_url(line: &str) -> Option<String> {
    get_attribute(line, "x-tvg-url")
        .filter(|u| !u.trim().is_empty())
        .or_else(|| get_attribute(line, "url-tvg").filter(|u| !u.trim().is_empty()))
        .map(|u| u.trim().to_string())
}

/// Parse playlist text into entries (file order) and the optional guide URL.
///
/// Single pass: a descriptor line opens a pending entry, the next
/// non-directive line completes it. URL lines without a pending entry are
/// dropped. Zero entries is reported as [`IngestError::EmptyPlaylist`].
pub fn parse_playlist(text: &str) -> Result<ParsedPlaylist> {
    let mut entries = Vec::new();
    let mut epg_url: Option<String> = None;
    let mut pending: Option<ExtinfData> = None;
    let mut orphan_lines = 0usize;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with(HEADER_TOKEN) {
            if epg_url.is_none() {
                epg_url = header_epg_url(trimmed);
            }
            continue;
        }

        if trimmed.starts_with(EXTINF_TOKEN) {
            pending = parse_extinf(trimmed);
            continue;
        }

        if trimmed.starts_with('#') {
            continue;
        }

        match pending.take() {
            Some(extinf) => entries.push(extinf.into_entry(trimmed)),
            None => orphan_lines += 1,
        }
    }

    if orphan_lines > 0 {
        tracing::debug!("Ignored {} URL lines without #EXTINF", orphan_lines);
    }

    if entries.is_empty() {
        let preview: String = text.chars().take(200).collect();
        tracing::warn!("No entries extracted from playlist. Content preview: {:?}", preview);
        return Err(IngestError::EmptyPlaylist);
    }

    Ok(ParsedPlaylist { entries, epg_url })
}

/// Ask Xtream panels for HLS instead of raw TS, which more players accept
pub fn rewrite_playlist_url(url: &str) -> String {
    if url.contains("output=ts") {
        url.replacen("output=ts", "output=m3u8", 1)
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extinf() {
        let line = r#"#EXTINF:-1 tvg-id="globo" tvg-name="Globo HD" tvg-logo="http://logo.com/globo.png" group-title="TV",Globo HD"#;
        let extinf = parse_extinf(line).unwrap();

        assert_eq!(extinf.title.as_deref(), Some("Globo HD"));
        assert_eq!(extinf.duration, -1);
        assert_eq!(extinf.attribute("tvg-id"), Some("globo"));
        assert_eq!(extinf.attribute("group-title"), Some("TV"));
    }

    #[test]
    fn test_parse_extinf_minimal() {
        let extinf = parse_extinf("#EXTINF:-1,Canal Teste").unwrap();

        assert_eq!(extinf.title.as_deref(), Some("Canal Teste"));
        assert_eq!(extinf.duration, -1);
        assert!(extinf.attributes.is_empty());
    }

    #[test]
    fn test_parse_extinf_rejects_other_directives() {
        assert!(parse_extinf("#EXTVLCOPT:http-user-agent=VLC").is_none());
    }

    #[test]
    fn test_name_uses_last_comma_segment() {
        let line = r#"#EXTINF:-1 group-title="Filmes, Lançamentos",Duna: Parte 2"#;
        let extinf = parse_extinf(line).unwrap();

        assert_eq!(extinf.display_name(), "Duna: Parte 2");
        assert_eq!(extinf.attribute("group-title"), Some("Filmes, Lançamentos"));
    }

    #[test]
    fn test_attribute_keys_are_case_insensitive() {
        let extinf = parse_extinf(r#"#EXTINF:-1 TVG-ID="Abc" Group-Title="News",ABC"#).unwrap();
        assert_eq!(extinf.attribute("tvg-id"), Some("Abc"));
        assert_eq!(extinf.attribute("group-title"), Some("News"));
        assert_eq!(get_attribute(r#"#EXTM3U X-TVG-URL="http://e/g.xml""#, "x-tvg-url").as_deref(), Some("http://e/g.xml"));
    }

    #[test]
    fn test_entries_preserve_file_order() {
        let text = "#EXTM3U\n\
            #EXTINF:-1 tvg-id=\"c\",Charlie\nhttp://h/c.ts\n\
            #EXTINF:-1 tvg-id=\"a\",Alpha\nhttp://h/a.ts\n\
            #EXTINF:-1 tvg-id=\"b\",Bravo\nhttp://h/b.ts\n";
        let parsed = parse_playlist(text).unwrap();

        let names: Vec<&str> = parsed.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Charlie", "Alpha", "Bravo"]);
        assert_eq!(parsed.entries[1].url, "http://h/a.ts");
        assert_eq!(parsed.entries[1].tvg_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_name_falls_back_to_tvg_name() {
        let text = "#EXTINF:-1 tvg-name=\"Foo\",\nhttp://h/foo.ts\n";
        let parsed = parse_playlist(text).unwrap();
        assert_eq!(parsed.entries[0].name, "Foo");
    }

    #[test]
    fn test_name_falls_back_to_placeholder() {
        let text = "#EXTINF:-1 group-title=\"News\",   \nhttp://h/x.ts\n";
        let parsed = parse_playlist(text).unwrap();
        assert_eq!(parsed.entries[0].name, UNKNOWN_TITLE);
        assert_eq!(parsed.entries[0].group_title, "News");
    }

    #[test]
    fn test_orphan_url_line_is_ignored() {
        let text = "#EXTM3U\nhttp://h/orphan.ts\n#EXTINF:-1,Real\nhttp://h/real.ts\n";
        let parsed = parse_playlist(text).unwrap();

        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].url, "http://h/real.ts");
    }

    #[test]
    fn test_url_after_other_directives_still_attaches() {
        let text = "#EXTINF:-1,Canal\n#EXTVLCOPT:http-user-agent=VLC\n\r\n  http://h/canal.ts  \r\n";
        let parsed = parse_playlist(text).unwrap();
        assert_eq!(parsed.entries[0].url, "http://h/canal.ts");
    }

    #[test]
    fn test_pending_entry_replaced_by_next_descriptor() {
        let text = "#EXTINF:-1,Lost\n#EXTINF:-1,Kept\nhttp://h/kept.ts\nhttp://h/extra.ts\n";
        let parsed = parse_playlist(text).unwrap();

        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].name, "Kept");
    }

    #[test]
    fn test_epg_url_discovery() {
        let text = "#EXTM3U x-tvg-url=\"http://epg.example/x.xml\"\n#EXTINF:-1,A\nhttp://h/a.ts\n";
        let parsed = parse_playlist(text).unwrap();
        assert_eq!(parsed.epg_url.as_deref(), Some("http://epg.example/x.xml"));

        let text = "#EXTM3U\n#EXTINF:-1,A\nhttp://h/a.ts\n";
        assert_eq!(parse_playlist(text).unwrap().epg_url, None);
    }

    #[test]
    fn test_epg_url_alias_and_first_match_wins() {
        let text = "#EXTINF:-1,A\nhttp://h/a.ts\n\
            #EXTM3U url-tvg=\"http://first/g.xml\"\n\
            #EXTM3U x-tvg-url=\"http://second/g.xml\"\n";
        let parsed = parse_playlist(text).unwrap();
        assert_eq!(parsed.epg_url.as_deref(), Some("http://first/g.xml"));
    }

    #[test]
    fn test_logo_fields() {
        let text = "#EXTINF:-1 tvg-logo=\"http://l/a.png\" tvg-id=\"\",A\nhttp://h/a.ts\n";
        let entry = &parse_playlist(text).unwrap().entries[0];

        assert_eq!(entry.logo_url.as_deref(), Some("http://l/a.png"));
        assert_eq!(entry.tvg_logo.as_deref(), Some("http://l/a.png"));
        assert_eq!(entry.tvg_id, None);
        assert_eq!(entry.group_title, "");
    }

    #[test]
    fn test_comment_only_playlist_is_empty() {
        let text = "#EXTM3U\n# just a comment\n#EXTVLCOPT:foo\n";
        assert!(matches!(parse_playlist(text), Err(IngestError::EmptyPlaylist)));
        assert!(matches!(parse_playlist(""), Err(IngestError::EmptyPlaylist)));
    }

    #[test]
    fn test_rewrite_playlist_url() {
        assert_eq!(
            rewrite_playlist_url("http://p:8080/get.php?username=u&password=p&type=m3u_plus&output=ts"),
            "http://p:8080/get.php?username=u&password=p&type=m3u_plus&output=m3u8"
        );
        assert_eq!(rewrite_playlist_url("http://h/list.m3u"), "http://h/list.m3u");
    }
}
