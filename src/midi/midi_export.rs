//! Standard MIDI File (SMF) export of reconstructed note streams.
//!
//! Turns the (pitch, start, duration) triples recovered from compact records
//! back into a playable .mid file, so a converted stream can be auditioned
//! in any sequencer.
//!
//! # Format Details
//!
//! Exports as SMF Format 1 (multi-track) at a fixed 120 BPM and 480 PPQ:
//! - Track 0: Tempo meta event and timeline name
//! - Tracks 1-N: One track per export unit with note on/off events
//!
//! Millisecond timing is converted to ticks at that fixed tempo, so the
//! original tempo map is not reproduced, only the real-time result.

use crate::output::ReconstructedNote;

/// Resolution of exported files.
pub const EXPORT_PPQ: u32 = 480;

/// Tempo of exported files.
pub const EXPORT_BPM: u32 = 120;

/// Velocity written for every note on.
const EXPORT_VELOCITY: u8 = 100;

/// One output track of a MIDI export.
#[derive(Debug, Clone, Copy)]
pub struct ExportTrack<'a> {
    /// Track name written as a meta event.
    pub name: &'a str,

    /// MIDI channel (0-15).
    pub channel: u8,

    /// Notes in chronological order.
    pub notes: &'a [ReconstructedNote],
}

/// Writes a variable-length quantity (VLQ) used for delta times in MIDI.
///
/// VLQ encodes values using 7 bits per byte, with the MSB indicating
/// whether more bytes follow (1 = more bytes, 0 = last byte).
fn write_vlq(value: u32, buffer: &mut Vec<u8>) {
    if value == 0 {
        buffer.push(0);
        return;
    }

    let mut temp = value;
    let mut bytes = Vec::with_capacity(4);

    while temp > 0 {
        bytes.push((temp & 0x7F) as u8);
        temp >>= 7;
    }

    // Write bytes in reverse order with continuation bits
    for (i, &byte) in bytes.iter().rev().enumerate() {
        if i < bytes.len() - 1 {
            buffer.push(byte | 0x80);
        } else {
            buffer.push(byte);
        }
    }
}

/// MIDI event types written by the exporter.
enum MidiEvent {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
    /// Set tempo: microseconds per quarter note
    SetTempo { microseconds_per_beat: u32 },
    TrackName { name: String },
    EndOfTrack,
}

/// Represents a timed MIDI event for sorting and writing.
struct TimedEvent {
    /// Absolute tick position
    tick: u32,
    event: MidiEvent,
    /// Priority for sorting events at the same tick (lower = first).
    /// Note offs sort before note ons so back-to-back repeats re-trigger.
    priority: u8,
}

impl TimedEvent {
    fn new(tick: u32, event: MidiEvent, priority: u8) -> Self {
        Self {
            tick,
            event,
            priority,
        }
    }
}

/// Writes a single MIDI event to the buffer (without delta time).
fn write_event(event: &MidiEvent, buffer: &mut Vec<u8>) {
    match event {
        MidiEvent::NoteOn {
            channel,
            pitch,
            velocity,
        } => {
            buffer.push(0x90 | (channel & 0x0F));
            buffer.push(pitch & 0x7F);
            buffer.push(*velocity);
        }
        MidiEvent::NoteOff { channel, pitch } => {
            buffer.push(0x80 | (channel & 0x0F));
            buffer.push(pitch & 0x7F);
            buffer.push(0);
        }
        MidiEvent::SetTempo {
            microseconds_per_beat,
        } => {
            // Meta event: FF 51 03 tt tt tt
            buffer.extend_from_slice(&[0xFF, 0x51, 0x03]);
            buffer.push((microseconds_per_beat >> 16) as u8);
            buffer.push((microseconds_per_beat >> 8) as u8);
            buffer.push(*microseconds_per_beat as u8);
        }
        MidiEvent::TrackName { name } => {
            // Meta event: FF 03 len text
            buffer.extend_from_slice(&[0xFF, 0x03]);
            let name_bytes = name.as_bytes();
            write_vlq(name_bytes.len() as u32, buffer);
            buffer.extend_from_slice(name_bytes);
        }
        MidiEvent::EndOfTrack => {
            buffer.extend_from_slice(&[0xFF, 0x2F, 0x00]);
        }
    }
}

/// Builds the track chunk data from a list of timed events.
///
/// Events are sorted by tick position and converted to delta times.
fn build_track_data(events: &mut [TimedEvent]) -> Vec<u8> {
    let mut buffer = Vec::new();
    events.sort_by(|a, b| a.tick.cmp(&b.tick).then(a.priority.cmp(&b.priority)));

    let mut last_tick = 0u32;
    for timed_event in events.iter() {
        let delta = timed_event.tick.saturating_sub(last_tick);
        write_vlq(delta, &mut buffer);
        write_event(&timed_event.event, &mut buffer);
        last_tick = timed_event.tick;
    }

    buffer
}

/// Appends an MTrk chunk to the output.
fn write_track_chunk(out: &mut Vec<u8>, track_data: &[u8]) {
    out.extend_from_slice(b"MTrk");
    out.extend_from_slice(&(track_data.len() as u32).to_be_bytes());
    out.extend_from_slice(track_data);
}

/// Converts milliseconds to export ticks at [`EXPORT_BPM`] / [`EXPORT_PPQ`].
fn ms_to_ticks(ms: u64) -> u32 {
    let ticks = (ms as f64 * (EXPORT_PPQ * EXPORT_BPM) as f64 / 60_000.0).round();
    ticks.min(u32::MAX as f64) as u32
}

/// Exports reconstructed tracks to Standard MIDI File bytes.
///
/// # Arguments
///
/// * `name` - Name written to the tempo track
/// * `tracks` - Tracks to write, one MTrk chunk each
/// * `release_gap_ms` - Milliseconds cut from the end of every note so
///   repeated pitches are heard as separate attacks
///
/// # Returns
///
/// The complete file contents
pub fn export_to_midi(name: &str, tracks: &[ExportTrack<'_>], release_gap_ms: u32) -> Vec<u8> {
    let mut out = Vec::new();

    // Number of tracks: 1 tempo track + N music tracks
    let num_tracks = 1 + tracks.len().min(u16::MAX as usize - 1) as u16;

    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // Format 1
    out.extend_from_slice(&num_tracks.to_be_bytes());
    out.extend_from_slice(&(EXPORT_PPQ as u16).to_be_bytes());

    let mut end_tick = 0u32;

    let mut chunks = Vec::with_capacity(tracks.len());
    for track in tracks.iter().take(num_tracks as usize - 1) {
        let mut events = vec![TimedEvent::new(
            0,
            MidiEvent::TrackName {
                name: track.name.to_string(),
            },
            0,
        )];

        for note in track.notes {
            let start = ms_to_ticks(note.start_ms);
            let sounding_ms = note.duration_ms.saturating_sub(release_gap_ms);
            let end = start.saturating_add(ms_to_ticks(sounding_ms as u64).max(1));

            events.push(TimedEvent::new(
                start,
                MidiEvent::NoteOn {
                    channel: track.channel,
                    pitch: note.pitch,
                    velocity: EXPORT_VELOCITY,
                },
                11,
            ));
            events.push(TimedEvent::new(
                end,
                MidiEvent::NoteOff {
                    channel: track.channel,
                    pitch: note.pitch,
                },
                10,
            ));
        }

        let track_end = events.iter().map(|e| e.tick).max().unwrap_or(0);
        end_tick = end_tick.max(track_end);
        events.push(TimedEvent::new(track_end, MidiEvent::EndOfTrack, 255));
        chunks.push(build_track_data(&mut events));
    }

    // Track 0: name and tempo
    {
        let mut events = vec![
            TimedEvent::new(
                0,
                MidiEvent::TrackName {
                    name: name.to_string(),
                },
                0,
            ),
            TimedEvent::new(
                0,
                MidiEvent::SetTempo {
                    microseconds_per_beat: 60_000_000 / EXPORT_BPM,
                },
                1,
            ),
            TimedEvent::new(end_tick, MidiEvent::EndOfTrack, 255),
        ];
        let track_data = build_track_data(&mut events);
        write_track_chunk(&mut out, &track_data);
    }

    for chunk in &chunks {
        write_track_chunk(&mut out, chunk);
    }

    out
}
