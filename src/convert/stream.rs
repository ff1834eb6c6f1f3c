//! Track merging and timeline building.
//!
//! Turns the notes of one or more source tracks into a single ordered
//! [`NoteStream`], resolving ticks to milliseconds through a [`TempoMap`].

use super::delay::{split_delay, ChainPitch};
use super::record::NoteStream;
use super::tempo::TempoMap;
use crate::midi::{RawNoteEvent, SourceTrack};

/// Builds the record stream for the given tracks.
///
/// 1. All notes are flattened in track order, then stable-sorted by start
///    tick, so simultaneous notes keep "track order, then within-track
///    order".
/// 2. A late first note is preceded by a zero-pitch record whose delay is
///    the offset at the tempo of tick 0.
/// 3. Each note's delay is the tick gap to the next note (or its own
///    duration for the last note), converted at the tempo of its own start.
/// 4. Durations are converted the same way, then rounded and encoded.
///
/// Tracks without notes contribute nothing.
pub fn build_stream(
    tracks: &[&SourceTrack],
    tempo: &TempoMap,
    exponent_bits: u8,
    chain: ChainPitch,
) -> NoteStream {
    let mut notes: Vec<RawNoteEvent> = tracks
        .iter()
        .flat_map(|t| t.notes().iter().copied())
        .collect();
    notes.sort_by_key(|n| n.start_ticks);

    let mut stream = NoteStream::new();
    let Some(first) = notes.first() else {
        return stream;
    };

    if first.start_ticks > 0 {
        let offset_ms = tempo.span_ms(first.start_ticks, 0);
        stream.extend(split_delay(0, 0.0, offset_ms, exponent_bits, chain));
    }

    for (i, note) in notes.iter().enumerate() {
        let gap_ticks = match notes.get(i + 1) {
            Some(next) => next.start_ticks - note.start_ticks,
            None => note.duration_ticks,
        };
        let delay_ms = tempo.span_ms(gap_ticks, note.start_ticks);
        let duration_ms = tempo.span_ms(note.duration_ticks, note.start_ticks);

        stream.extend(split_delay(
            note.pitch,
            duration_ms,
            delay_ms,
            exponent_bits,
            chain,
        ));
    }

    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::encode8;
    use crate::convert::CompactRecord;
    use crate::midi::TempoEntry;

    fn track(notes: &[(u8, u32, u32)]) -> SourceTrack {
        let mut track = SourceTrack::new("t", 0);
        for &(pitch, start, duration) in notes {
            track.create_note(pitch, start, duration, 0);
        }
        track
    }

    fn summary(stream: &NoteStream) -> Vec<(u8, u8, u16)> {
        stream
            .iter()
            .map(|r| (r.pitch, r.duration8, r.delay))
            .collect()
    }

    #[test]
    fn test_two_quarter_notes() {
        let t = track(&[(60, 0, 480), (64, 960, 480)]);
        let tempo = TempoMap::new(&[], 480);
        let stream = build_stream(&[&t], &tempo, 3, ChainPitch::Reuse);

        // First note's delay is the gap to the second: 960 ticks = 1000 ms
        assert_eq!(
            summary(&stream),
            vec![(60, encode8(500, 3), 1000), (64, encode8(500, 3), 500)]
        );
    }

    #[test]
    fn test_adjacent_quarter_notes() {
        let t = track(&[(60, 0, 480), (64, 480, 480)]);
        let tempo = TempoMap::new(&[TempoEntry::new(0, 120.0)], 480);
        let stream = build_stream(&[&t], &tempo, 3, ChainPitch::Reuse);

        assert_eq!(
            stream.records(),
            &[
                CompactRecord::new(60, encode8(500, 3), 500, 500),
                CompactRecord::new(64, encode8(500, 3), 500, 500),
            ]
        );
    }

    #[test]
    fn test_leading_silence() {
        let t = track(&[(60, 480, 480), (64, 960, 480)]);
        let tempo = TempoMap::new(&[], 480);
        let stream = build_stream(&[&t], &tempo, 3, ChainPitch::Reuse);

        assert_eq!(
            summary(&stream),
            vec![
                (0, 0, 500),
                (60, encode8(500, 3), 500),
                (64, encode8(500, 3), 500)
            ]
        );
    }

    #[test]
    fn test_leading_silence_quarter_at_double_resolution() {
        // 480 ticks at 960 PPQ, 120 BPM = 250 ms
        let t = track(&[(60, 480, 960)]);
        let tempo = TempoMap::new(&[], 960);
        let stream = build_stream(&[&t], &tempo, 3, ChainPitch::Reuse);
        assert_eq!(stream.records()[0].delay, 250);
        assert_eq!(stream.records()[0].pitch, 0);
    }

    #[test]
    fn test_oversized_rest_splits() {
        // 125 BPM at 480 PPQ = 1 ms per tick
        let t = track(&[(60, 0, 100), (62, 70_000, 100)]);
        let tempo = TempoMap::new(&[TempoEntry::new(0, 125.0)], 480);
        let stream = build_stream(&[&t], &tempo, 3, ChainPitch::Reuse);

        let first_note: Vec<_> = stream.iter().take_while(|r| r.pitch == 60).collect();
        assert!(first_note.len() >= 2);
        let sum: u64 = first_note.iter().map(|r| r.delay as u64).sum();
        assert_eq!(sum, 70_000);
        assert_eq!(stream.records().last().unwrap().pitch, 62);
    }

    #[test]
    fn test_tempo_change_applies_from_note_start() {
        // Second note starts where tempo halves
        let t = track(&[(60, 0, 480), (62, 480, 480)]);
        let tempo = TempoMap::new(
            &[TempoEntry::new(0, 120.0), TempoEntry::new(480, 60.0)],
            480,
        );
        let stream = build_stream(&[&t], &tempo, 3, ChainPitch::Reuse);
        assert_eq!(stream.records()[0].delay, 500);
        assert_eq!(stream.records()[1].delay, 1000);
        assert_eq!(stream.records()[1].duration_ms, 1000);
    }

    #[test]
    fn test_merge_tie_break_is_track_order() {
        let a = track(&[(60, 0, 480), (62, 480, 480)]);
        let b = track(&[(48, 0, 480), (50, 480, 480)]);
        let tempo = TempoMap::new(&[], 480);

        let stream = build_stream(&[&a, &b], &tempo, 3, ChainPitch::Reuse);
        let pitches: Vec<_> = stream.iter().map(|r| r.pitch).collect();
        assert_eq!(pitches, vec![60, 48, 62, 50]);
        let delays: Vec<_> = stream.iter().map(|r| r.delay).collect();
        assert_eq!(delays, vec![0, 500, 0, 500]);

        let swapped = build_stream(&[&b, &a], &tempo, 3, ChainPitch::Reuse);
        let pitches: Vec<_> = swapped.iter().map(|r| r.pitch).collect();
        assert_eq!(pitches, vec![48, 60, 50, 62]);
    }

    #[test]
    fn test_deterministic() {
        let a = track(&[(60, 0, 480), (62, 100, 30), (64, 100, 999)]);
        let b = track(&[(40, 50, 480), (41, 100, 1)]);
        let tempo = TempoMap::new(&[TempoEntry::new(90, 77.0)], 96);

        let first = build_stream(&[&a, &b], &tempo, 3, ChainPitch::Reuse);
        let second = build_stream(&[&a, &b], &tempo, 3, ChainPitch::Reuse);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_tracks_produce_empty_stream() {
        let empty = track(&[]);
        let tempo = TempoMap::new(&[], 480);
        assert!(build_stream(&[], &tempo, 3, ChainPitch::Reuse).is_empty());
        assert!(build_stream(&[&empty], &tempo, 3, ChainPitch::Reuse).is_empty());
    }
}
