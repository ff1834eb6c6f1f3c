//! Rebuilding a playable note list from a record stream.

use crate::convert::{NoteStream, MAX_RECORD_DELAY};
use serde::{Deserialize, Serialize};

/// A note recovered from a record stream, in real time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructedNote {
    pub pitch: u8,

    /// Start time in milliseconds from the beginning of the stream.
    pub start_ms: u64,

    /// Retained (pre-encoding) duration in milliseconds.
    pub duration_ms: u32,
}

/// Walks a stream in order, accumulating delays into absolute start times.
///
/// Rests (pitch 0) and delay-chain continuation links emit nothing but
/// still advance the clock. A record is a link when the record before it
/// carries the full [`MAX_RECORD_DELAY`]; every other pitched record is a
/// note, zero-length ones included.
pub fn reconstruct(stream: &NoteStream) -> Vec<ReconstructedNote> {
    let mut notes = Vec::with_capacity(stream.len());
    let mut time_ms: u64 = 0;
    let mut in_chain = false;

    for record in stream {
        if !in_chain && !record.is_rest() {
            notes.push(ReconstructedNote {
                pitch: record.pitch,
                start_ms: time_ms,
                duration_ms: record.duration_ms,
            });
        }
        in_chain = record.delay == MAX_RECORD_DELAY;
        time_ms += record.delay as u64;
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{build_stream, ChainPitch, CompactRecord, TempoMap};
    use crate::midi::SourceTrack;

    #[test]
    fn test_accumulates_delays() {
        let stream: NoteStream = [
            CompactRecord::new(0, 0, 250, 0),
            CompactRecord::new(60, 126, 500, 500),
            CompactRecord::new(64, 126, 500, 480),
        ]
        .into_iter()
        .collect();

        let notes = reconstruct(&stream);
        assert_eq!(
            notes,
            vec![
                ReconstructedNote {
                    pitch: 60,
                    start_ms: 250,
                    duration_ms: 500
                },
                ReconstructedNote {
                    pitch: 64,
                    start_ms: 750,
                    duration_ms: 480
                },
            ]
        );
    }

    #[test]
    fn test_chain_links_are_silent() {
        let mut track = SourceTrack::new("t", 0);
        track.create_note(60, 0, 100, 0);
        track.create_note(62, 70_000, 100, 0);
        // 1 ms per tick
        let tempo = TempoMap::new(&[crate::midi::TempoEntry::new(0, 125.0)], 480);

        for chain in [ChainPitch::Reuse, ChainPitch::Rest] {
            let stream = build_stream(&[&track], &tempo, 3, chain);
            let notes = reconstruct(&stream);
            let starts: Vec<_> = notes.iter().map(|n| (n.pitch, n.start_ms)).collect();
            assert_eq!(starts, vec![(60, 0), (62, 70_000)]);
        }
    }

    #[test]
    fn test_zero_length_notes_are_kept() {
        let mut drums = SourceTrack::new("kit", crate::midi::DRUM_CHANNEL);
        drums.create_note(36, 0, 0, 0);
        drums.create_note(38, 480, 240, 0);
        let tempo = TempoMap::new(&[], 480);

        let stream = build_stream(&[&drums], &tempo, 3, ChainPitch::Reuse);
        let notes = reconstruct(&stream);
        assert_eq!(
            notes,
            vec![
                ReconstructedNote {
                    pitch: 36,
                    start_ms: 0,
                    duration_ms: 0
                },
                ReconstructedNote {
                    pitch: 38,
                    start_ms: 500,
                    duration_ms: 250
                },
            ]
        );
    }

    #[test]
    fn test_exact_chain_boundary() {
        // A 65535 ms delay ends in a zero-delay link that must stay silent
        let stream: NoteStream = [
            CompactRecord::new(60, 0, 65535, 0),
            CompactRecord::new(60, 0, 0, 0),
            CompactRecord::new(62, 0, 0, 0),
        ]
        .into_iter()
        .collect();

        let starts: Vec<_> = reconstruct(&stream)
            .iter()
            .map(|n| (n.pitch, n.start_ms))
            .collect();
        assert_eq!(starts, vec![(60, 0), (62, 65535)]);
    }

    #[test]
    fn test_restores_merged_order() {
        let mut a = SourceTrack::new("a", 0);
        a.create_note(60, 0, 480, 0);
        a.create_note(62, 960, 480, 0);
        let mut b = SourceTrack::new("b", 1);
        b.create_note(48, 480, 480, 1);
        let tempo = TempoMap::new(&[], 480);

        let stream = build_stream(&[&a, &b], &tempo, 3, ChainPitch::Reuse);
        let notes = reconstruct(&stream);
        let starts: Vec<_> = notes.iter().map(|n| (n.pitch, n.start_ms)).collect();
        assert_eq!(starts, vec![(60, 0), (48, 500), (62, 1000)]);
    }
}
