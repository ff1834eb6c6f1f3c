//! Tempo resolution: ticks to milliseconds under a variable tempo.

use crate::midi::{TempoEntry, DEFAULT_BPM};

/// Sorted tempo changes plus the timeline's PPQ.
///
/// Always contains an entry at tick 0: if the source list is empty or starts
/// later, a default 120 BPM entry is synthesized, so every tick resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    entries: Vec<TempoEntry>,
    ppq: u32,
}

impl TempoMap {
    /// Builds a tempo map from a (possibly empty or unsorted) tempo list.
    pub fn new(tempos: &[TempoEntry], ppq: u32) -> Self {
        let mut entries = tempos.to_vec();
        entries.sort_by_key(|t| t.ticks);
        if entries.first().is_none_or(|t| t.ticks > 0) {
            entries.insert(0, TempoEntry::new(0, DEFAULT_BPM));
        }
        Self { entries, ppq }
    }

    /// Returns the tempo entry in effect at `tick`: the one with the
    /// greatest `ticks <= tick`.
    pub fn entry_at(&self, tick: u32) -> &TempoEntry {
        let pos = self.entries.partition_point(|t| t.ticks <= tick);
        // entries[0].ticks == 0, so pos >= 1
        &self.entries[pos.saturating_sub(1)]
    }

    /// Milliseconds per tick at `tick`: `60000 / (bpm * ppq)`.
    pub fn ms_per_tick(&self, tick: u32) -> f64 {
        60_000.0 / (self.entry_at(tick).bpm * self.ppq as f64)
    }

    /// Converts a tick span to milliseconds using the tempo at `at_tick`.
    pub fn span_ms(&self, ticks: u32, at_tick: u32) -> f64 {
        ticks as f64 * self.ms_per_tick(at_tick)
    }

    /// Returns the resolved entries, default included.
    pub fn entries(&self) -> &[TempoEntry] {
        &self.entries
    }
}
