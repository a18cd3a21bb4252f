//! Prometheus metrics for the ingestion pipelines
//!
//! Registered in the default registry so `GET /metrics` picks them up via
//! `prometheus::gather()`.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

pub const PIPELINE_PLAYLIST: &str = "playlist";
pub const PIPELINE_EPG: &str = "epg";

lazy_static! {
    pub static ref INGEST_LOADS: IntCounterVec = register_int_counter_vec!(
        "ingest_loads_total",
        "Playlist and guide loads by outcome",
        &["pipeline", "outcome"]
    )
    .unwrap();
    pub static ref EPG_SKIPPED_PROGRAMMES: IntCounter = register_int_counter!(
        "epg_skipped_programmes_total",
        "Programme records dropped while parsing guides"
    )
    .unwrap();
    pub static ref PLAYLIST_ENTRIES: IntGauge =
        register_int_gauge!("playlist_entries", "Entries in the published playlist").unwrap();
    pub static ref EPG_PROGRAMMES: IntGauge =
        register_int_gauge!("epg_programmes", "Programmes in the published guide index").unwrap();
}

/// Count one finished load. `outcome` is "published", "superseded" or an
/// error kind.
pub fn record_load(pipeline: &str, outcome: &str) {
    INGEST_LOADS.with_label_values(&[pipeline, outcome]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_load_increments() {
        let before = INGEST_LOADS
            .with_label_values(&[PIPELINE_EPG, "xml_structure"])
            .get();
        record_load(PIPELINE_EPG, "xml_structure");
        let after = INGEST_LOADS
            .with_label_values(&[PIPELINE_EPG, "xml_structure"])
            .get();
        assert!(after > before);
    }

    #[test]
    fn test_metrics_are_gathered() {
        PLAYLIST_ENTRIES.set(3);
        let names: Vec<String> = prometheus::gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "playlist_entries"));
    }
}
