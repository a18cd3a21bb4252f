//! XMLTV (EPG) ingestion
//!
//! Parses the guide, normalizes programme dates and builds the per-channel
//! index used for now/next lookups.

pub mod date;
pub mod index;
pub mod parser;

pub use date::parse_xmltv_date;
pub use index::{normalize_channel_id, ProgramIndex};
pub use parser::{parse_xmltv, parse_xmltv_bytes, parse_xmltv_reader};
