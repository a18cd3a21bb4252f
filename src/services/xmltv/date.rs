//! XMLTV timestamp normalization
//!
//! `YYYYMMDDHHMMSS [±HHMM]` is sliced at fixed offsets rather than run
//! through a general date parser. The wall-clock fields are taken as UTC and
//! the offset is then applied: `+HHMM` subtracts, `-HHMM` adds.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::{IngestError, Result};

const STAMP_LEN: usize = 14;

fn malformed(input: &str) -> IngestError {
    IngestError::MalformedProgramDate {
        input: input.to_string(),
    }
}

/// Signed offset in minutes from a `±HHMM` suffix
fn parse_offset_minutes(suffix: &str) -> Option<i64> {
    let (sign, digits) = match suffix.as_bytes().first()? {
        b'+' => (1, &suffix[1..]),
        b'-' => (-1, &suffix[1..]),
        _ => return None,
    };

    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i64 = digits[0..2].parse().ok()?;
    let minutes: i64 = digits[2..4].parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

/// Parse an XMLTV timestamp to an absolute UTC instant
pub fn parse_xmltv_date(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();

    if trimmed.len() < STAMP_LEN || !trimmed.is_char_boundary(STAMP_LEN) {
        return Err(malformed(input));
    }

    let (stamp, suffix) = trimmed.split_at(STAMP_LEN);
    if !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(input));
    }

    // All ASCII digits, so the slices below cannot fail to parse
    let field = |range: std::ops::Range<usize>| -> u32 { stamp[range].parse().unwrap_or(0) };
    let year = field(0..4) as i32;
    let month = field(4..6);
    let day = field(6..8);
    let hour = field(8..10);
    let minute = field(10..12);
    let second = field(12..14);

    let wall_clock = Utc
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .ok_or_else(|| malformed(input))?;

    let suffix = suffix.trim();
    if suffix.is_empty() {
        return Ok(wall_clock);
    }

    let offset = parse_offset_minutes(suffix).ok_or_else(|| malformed(input))?;
    Ok(wall_clock - Duration::minutes(offset))
}
