//! XMLTV guide parser
//! Streaming event parser for `<tv><programme>` documents.
//! Supports both plain XML and gzip-compressed (.xml.gz) payloads.

use flate2::read::GzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::io::{BufRead, BufReader};

use super::date::parse_xmltv_date;
use super::index::ProgramIndex;
use crate::error::{IngestError, Result};
use crate::models::Program;

/// Gzip magic number
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Skipped records logged individually before going quiet
const MAX_LOGGED_SKIPS: usize = 20;

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq)]
enum ParserState {
    Root,
    Programme,
    Title,
    Desc,
}

/// Programme as it appears in the document, before date normalization
#[derive(Debug, Default)]
struct RawProgramme {
    channel: String,
    start: String,
    stop: String,
    title: String,
    description: Option<String>,
}

impl RawProgramme {
    fn from_element(e: &BytesStart) -> Self {
        let mut raw = RawProgramme::default();
        for attr in e.attributes().flatten() {
            let value = decode_xml_entities(&String::from_utf8_lossy(attr.value.as_ref()));
            match attr.key.as_ref() {
                b"channel" => raw.channel = value,
                b"start" => raw.start = value,
                b"stop" => raw.stop = value,
                _ => {}
            }
        }
        raw
    }

    /// Validate and normalize; `Err` carries the reason the record is skipped
    fn into_program(self) -> std::result::Result<Program, String> {
        let channel_id = self.channel.trim().to_string();
        if channel_id.is_empty() {
            return Err("missing channel".to_string());
        }
        if self.title.is_empty() {
            return Err(format!("missing title on channel '{}'", channel_id));
        }

        let start = parse_xmltv_date(&self.start).map_err(|e| e.to_string())?;
        let stop = parse_xmltv_date(&self.stop).map_err(|e| e.to_string())?;
        if start >= stop {
            return Err(format!(
                "'{}' on '{}' stops before it starts",
                self.title, channel_id
            ));
        }

        Ok(Program {
            channel_id,
            title: self.title,
            description: self.description,
            start,
            stop,
        })
    }
}

/// Parse EPG from an XMLTV string
pub fn parse_xmltv(xml: &str) -> Result<ProgramIndex> {
    parse_xmltv_reader(xml.as_bytes())
}

/// Parse EPG from raw bytes, decompressing gzip payloads first
pub fn parse_xmltv_bytes(bytes: &[u8]) -> Result<ProgramIndex> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let decoder = GzDecoder::new(bytes);
        parse_xmltv_reader(BufReader::with_capacity(64 * 1024, decoder))
    } else {
        parse_xmltv_reader(bytes)
    }
}

/// Parse EPG from a reader.
///
/// Structural XML errors fail the whole document. Individual programmes with
/// bad dates, no channel or no title are skipped and counted.
pub fn parse_xmltv_reader<R: BufRead>(reader: R) -> Result<ProgramIndex> {
    let mut xml_reader = Reader::from_reader(reader);
    // Text is trimmed per element instead: entity references split text events

    let mut buf = Vec::with_capacity(8192);
    let mut state = ParserState::Root;
    let mut current: Option<RawProgramme> = None;
    let mut text_buf = String::new();
    let mut programs: Vec<Program> = Vec::new();
    let mut skipped = 0usize;
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        let position = xml_reader.buffer_position();
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if depth == 0 && saw_root {
                    return Err(second_root(position));
                }
                depth += 1;
                saw_root = true;

                match e.name().as_ref() {
                    b"programme" if state == ParserState::Root => {
                        state = ParserState::Programme;
                        current = Some(RawProgramme::from_element(e));
                    }
                    b"title" if state == ParserState::Programme => {
                        state = ParserState::Title;
                        text_buf.clear();
                    }
                    b"desc" if state == ParserState::Programme => {
                        state = ParserState::Desc;
                        text_buf.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                if depth == 0 && saw_root {
                    return Err(second_root(position));
                }
                saw_root = true;
                if e.name().as_ref() == b"programme" && state == ParserState::Root {
                    skip("self-closing programme without title".to_string(), &mut skipped);
                }
            }
            Ok(Event::Text(ref e)) => {
                if depth == 0 && !is_blank(e.as_ref()) {
                    return Err(content_outside_root(position));
                }
                if matches!(state, ParserState::Title | ParserState::Desc) {
                    text_buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(ref e)) => {
                if depth == 0 {
                    return Err(content_outside_root(position));
                }
                if matches!(state, ParserState::Title | ParserState::Desc) {
                    // Escape so the entity pass leaves CDATA content untouched
                    let raw = String::from_utf8_lossy(e.as_ref());
                    text_buf.push_str(&raw.replace('&', "&amp;"));
                }
            }
            Ok(Event::GeneralRef(ref e)) => {
                if depth == 0 {
                    return Err(content_outside_root(position));
                }
                if matches!(state, ParserState::Title | ParserState::Desc) {
                    text_buf.push('&');
                    text_buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                    text_buf.push(';');
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);

                match e.name().as_ref() {
                    b"title" if state == ParserState::Title => {
                        if let Some(ref mut prog) = current {
                            let title = decode_xml_entities(text_buf.trim());
                            if prog.title.is_empty() {
                                prog.title = title.trim().to_string();
                            }
                        }
                        state = ParserState::Programme;
                    }
                    b"desc" if state == ParserState::Desc => {
                        if let Some(ref mut prog) = current {
                            let desc = decode_xml_entities(text_buf.trim()).trim().to_string();
                            if prog.description.is_none() && !desc.is_empty() {
                                prog.description = Some(desc);
                            }
                        }
                        state = ParserState::Programme;
                    }
                    b"programme" if state == ParserState::Programme => {
                        if let Some(raw) = current.take() {
                            match raw.into_program() {
                                Ok(program) => programs.push(program),
                                Err(reason) => skip(reason, &mut skipped),
                            }
                        }
                        state = ParserState::Root;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => {
                if depth != 0 {
                    return Err(IngestError::XmlStructure(format!(
                        "unexpected end of document with {} unclosed element(s)",
                        depth
                    )));
                }
                if !saw_root {
                    return Err(IngestError::XmlStructure(
                        "document has no root element".to_string(),
                    ));
                }
                break;
            }
            Err(e) => {
                return Err(IngestError::XmlStructure(format!(
                    "XML error at byte {}: {}",
                    position, e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} malformed programme record(s)", skipped);
    }

    Ok(ProgramIndex::from_programs(programs).with_skipped(skipped))
}

fn second_root(position: impl std::fmt::Display) -> IngestError {
    IngestError::XmlStructure(format!("second root element at byte {}", position))
}

fn content_outside_root(position: impl std::fmt::Display) -> IngestError {
    IngestError::XmlStructure(format!("character data outside the root element at byte {}", position))
}

/// Whitespace (and a leading byte order mark) is allowed around the root
fn is_blank(bytes: &[u8]) -> bool {
    String::from_utf8_lossy(bytes)
        .chars()
        .all(|c| c.is_whitespace() || c == '\u{feff}')
}

fn skip(reason: String, skipped: &mut usize) {
    *skipped += 1;
    if *skipped <= MAX_LOGGED_SKIPS {
        tracing::debug!("Skipping programme: {}", reason);
    }
}

/// Decode predefined and numeric XML entities; unknown ones are kept verbatim
fn decode_xml_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        let decoded = after
            .find(';')
            .filter(|&semi| semi <= 12)
            .and_then(|semi| resolve_entity(&after[..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const GUIDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE tv SYSTEM "xmltv.dtd">
<tv generator-info-name="test">
  <channel id="bbc1"><display-name>BBC One</display-name></channel>
  <programme channel="bbc1" start="20250813110000 +0000" stop="20250813120000 +0000">
    <title lang="en">Later Show</title>
  </programme>
  <programme channel="bbc1" start="20250813100000 +0000" stop="20250813110000 +0000">
    <title lang="en">Morning News</title>
    <desc lang="en">Headlines &amp; weather</desc>
  </programme>
  <programme channel="Globo.br" start="20250813150000 -0300" stop="20250813160000 -0300">
    <title>Jornal Hoje</title>
  </programme>
</tv>"#;

    fn at(h: u32, m: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 13, h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_and_index() {
        let index = parse_xmltv(GUIDE).unwrap();

        assert_eq!(index.channel_count(), 2);
        assert_eq!(index.program_count(), 3);
        assert_eq!(index.skipped_count(), 0);

        let bbc = index.programs("bbc1");
        assert_eq!(bbc[0].title, "Morning News");
        assert_eq!(bbc[0].description.as_deref(), Some("Headlines & weather"));
        assert_eq!(bbc[1].title, "Later Show");
        assert_eq!(bbc[1].description, None);

        let now_next = index.program_for_channel("BBC1", at(10, 30));
        assert_eq!(now_next.current.map(|p| p.title.as_str()), Some("Morning News"));
        assert_eq!(now_next.next.map(|p| p.title.as_str()), Some("Later Show"));
    }

    #[test]
    fn test_offsets_applied() {
        let index = parse_xmltv(GUIDE).unwrap();
        let globo = index.programs("globo.br");

        assert_eq!(globo[0].start, at(18, 0));
        assert_eq!(globo[0].stop, at(19, 0));
        assert_eq!(globo[0].channel_id, "Globo.br");
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let xml = r#"<tv>
  <programme channel="a" start="garbage" stop="20250813110000 +0000"><title>Bad date</title></programme>
  <programme channel="a" start="20250813100000 +0000" stop="20250813110000 +0000"></programme>
  <programme start="20250813100000 +0000" stop="20250813110000 +0000"><title>No channel</title></programme>
  <programme channel="a" start="20250813110000 +0000" stop="20250813100000 +0000"><title>Backwards</title></programme>
  <programme channel="a" start="20250813100000 +0000" stop="20250813110000 +0000"/>
  <programme channel="a" start="20250813100000 +0000" stop="20250813110000 +0000"><title>Good</title></programme>
</tv>"#;
        let index = parse_xmltv(xml).unwrap();

        assert_eq!(index.program_count(), 1);
        assert_eq!(index.programs("a")[0].title, "Good");
        assert_eq!(index.skipped_count(), 5);
    }

    #[test]
    fn test_entities_and_cdata() {
        let xml = r#"<tv>
  <programme channel="a" start="20250813100000" stop="20250813110000">
    <title>Tom &amp; Jerry &#233; &#x41;</title>
    <desc><![CDATA[Cats & mice <3]]></desc>
  </programme>
</tv>"#;
        let index = parse_xmltv(xml).unwrap();
        let program = &index.programs("a")[0];

        assert_eq!(program.title, "Tom & Jerry é A");
        assert_eq!(program.description.as_deref(), Some("Cats & mice <3"));
    }

    #[test]
    fn test_first_title_wins() {
        let xml = r#"<tv><programme channel="a" start="20250813100000" stop="20250813110000">
<title lang="pt">Futebol</title><title lang="en">Football</title>
</programme></tv>"#;
        let index = parse_xmltv(xml).unwrap();
        assert_eq!(index.programs("a")[0].title, "Futebol");
    }

    #[test]
    fn test_structural_errors_fail_whole_document() {
        let mismatched = r#"<tv><programme channel="a" start="20250813100000" stop="20250813110000"><title>X</desc></programme></tv>"#;
        assert!(matches!(parse_xmltv(mismatched), Err(IngestError::XmlStructure(_))));

        let truncated = r#"<tv><programme channel="a" start="20250813100000" stop="20250813110000"><title>X</title>"#;
        assert!(matches!(parse_xmltv(truncated), Err(IngestError::XmlStructure(_))));

        assert!(matches!(parse_xmltv("not xml at all"), Err(IngestError::XmlStructure(_))));
        assert!(matches!(parse_xmltv(""), Err(IngestError::XmlStructure(_))));
    }

    #[test]
    fn test_single_root_required() {
        let two_roots = "<tv></tv><tv></tv>";
        assert!(matches!(parse_xmltv(two_roots), Err(IngestError::XmlStructure(_))));

        let self_closing_second = "<tv></tv><tv/>";
        assert!(matches!(parse_xmltv(self_closing_second), Err(IngestError::XmlStructure(_))));

        let leading_junk = "junk<tv></tv>";
        assert!(matches!(parse_xmltv(leading_junk), Err(IngestError::XmlStructure(_))));

        let trailing_junk = "<tv></tv>junk";
        assert!(matches!(parse_xmltv(trailing_junk), Err(IngestError::XmlStructure(_))));
    }

    #[test]
    fn test_empty_guide_is_valid() {
        let index = parse_xmltv("<tv></tv>").unwrap();
        assert!(index.is_empty());

        let with_prolog = "<?xml version=\"1.0\"?>\n<!-- guide -->\n<tv>\n</tv>\n";
        assert!(parse_xmltv(with_prolog).unwrap().is_empty());
    }

    #[test]
    fn test_gzip_payload() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(GUIDE.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let index = parse_xmltv_bytes(&compressed).unwrap();
        assert_eq!(index.program_count(), 3);

        let plain = parse_xmltv_bytes(GUIDE.as_bytes()).unwrap();
        assert_eq!(plain.program_count(), 3);
    }

    #[test]
    fn test_decode_xml_entities() {
        assert_eq!(decode_xml_entities("a &lt;b&gt; &quot;c&quot;"), "a <b> \"c\"");
        assert_eq!(decode_xml_entities("AT&T"), "AT&T");
        assert_eq!(decode_xml_entities("&unknown; &#xZZ;"), "&unknown; &#xZZ;");
    }
}
