use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::models::{NowNext, Program};

/// Key used on both sides of a channel lookup
pub fn normalize_channel_id(channel_id: &str) -> String {
    channel_id.trim().to_lowercase()
}

/// Per-channel programme index, each channel sorted by start time.
///
/// Built once per guide load and never mutated afterwards; reloads build a
/// new index and swap it in.
#[derive(Debug, Clone, Default)]
pub struct ProgramIndex {
    programs: HashMap<String, Vec<Program>>,
    skipped: usize,
}

impl ProgramIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Group programmes by normalized channel id and sort each channel.
    /// Duplicates are kept; equal start times keep source order.
    pub fn from_programs<I>(programs: I) -> Self
    where
        I: IntoIterator<Item = Program>,
    {
        let mut by_channel: HashMap<String, Vec<Program>> = HashMap::new();
        for program in programs {
            by_channel
                .entry(normalize_channel_id(&program.channel_id))
                .or_default()
                .push(program);
        }

        for programs in by_channel.values_mut() {
            programs.sort_by_key(|p| p.start);
        }

        Self {
            programs: by_channel,
            skipped: 0,
        }
    }

    pub(crate) fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped;
        self
    }

    /// Current and next programme for a channel at `now`
    pub fn program_for_channel(&self, channel_id: &str, now: DateTime<Utc>) -> NowNext<'_> {
        let programs = self.programs(channel_id);

        match programs.iter().position(|p| p.is_airing(now)) {
            Some(i) => NowNext {
                current: programs.get(i),
                next: programs.get(i + 1),
            },
            None => NowNext::default(),
        }
    }

    /// All programmes for a channel, sorted by start
    pub fn programs(&self, channel_id: &str) -> &[Program] {
        self.programs
            .get(&normalize_channel_id(channel_id))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Programmes overlapping `[from, to)`
    pub fn programs_in_range(
        &self,
        channel_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<&Program> {
        self.programs(channel_id)
            .iter()
            .filter(|p| p.stop > from && p.start < to)
            .collect()
    }

    pub fn contains_channel(&self, channel_id: &str) -> bool {
        self.programs.contains_key(&normalize_channel_id(channel_id))
    }

    pub fn channel_count(&self) -> usize {
        self.programs.len()
    }

    /// Total number of programs
    pub fn program_count(&self) -> usize {
        self.programs.values().map(|v| v.len()).sum()
    }

    /// Programme records dropped while parsing (bad dates, missing title...)
    pub fn skipped_count(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
