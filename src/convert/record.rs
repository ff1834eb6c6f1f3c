//! Compact note records and the streams built from them.

use serde::{Deserialize, Serialize};

/// Size of one record on the wire, in bytes.
pub const RECORD_SIZE: usize = 4;

/// Largest delay a single record can carry.
pub const MAX_RECORD_DELAY: u16 = u16::MAX;

/// One fixed-width output record: pitch, encoded duration, delay to the
/// next record.
///
/// `duration_ms` is the rounded duration before byte encoding. It is not
/// part of the wire format; reconstruction uses it instead of decoding
/// `duration8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompactRecord {
    /// MIDI pitch, or 0 for a rest.
    pub pitch: u8,

    /// Duration encoded by [`encode8`](super::encode8).
    pub duration8: u8,

    /// Milliseconds until the next record starts.
    pub delay: u16,

    /// Rounded duration in milliseconds, retained from before encoding.
    pub duration_ms: u32,
}

impl CompactRecord {
    pub fn new(pitch: u8, duration8: u8, delay: u16, duration_ms: u32) -> Self {
        Self {
            pitch,
            duration8,
            delay,
            duration_ms,
        }
    }

    /// Whether the record plays nothing (pitch 0).
    pub fn is_rest(&self) -> bool {
        self.pitch == 0
    }

    /// The 4 wire bytes: pitch, duration, delay (little-endian).
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let [lo, hi] = self.delay.to_le_bytes();
        [self.pitch, self.duration8, lo, hi]
    }
}

/// An ordered sequence of compact records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteStream {
    records: Vec<CompactRecord>,
}

impl NoteStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CompactRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[CompactRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Size of the stream on the wire, without any count prefix.
    pub fn byte_size(&self) -> usize {
        self.records.len() * RECORD_SIZE
    }

    /// Sum of all record delays in milliseconds.
    pub fn total_delay_ms(&self) -> u64 {
        self.records.iter().map(|r| r.delay as u64).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompactRecord> {
        self.records.iter()
    }
}

impl Extend<CompactRecord> for NoteStream {
    fn extend<T: IntoIterator<Item = CompactRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

impl FromIterator<CompactRecord> for NoteStream {
    fn from_iter<T: IntoIterator<Item = CompactRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a NoteStream {
    type Item = &'a CompactRecord;
    type IntoIter = std::slice::Iter<'a, CompactRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
