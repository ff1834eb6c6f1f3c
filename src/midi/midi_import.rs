//! Standard MIDI File (SMF) import functionality.
//!
//! Reads .mid data into a [`Timeline`]. Supports SMF Format 0 (single track)
//! and Format 1 (multi-track) files with metrical timing.
//!
//! # Limitations
//!
//! - Only note on/off pairs and tempo changes are imported
//! - Each channel found in a track chunk becomes its own source track
//! - Tracks without notes are dropped
//! - Ticks are kept at the file's native resolution

use super::{SourceTrack, TempoEntry, Timeline, TimelineError};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while loading a timeline.
#[derive(Debug, Error)]
pub enum ImportError {
    /// MIDI parsing failed
    #[error("MIDI parse error: {0}")]
    Parse(String),

    /// Unsupported MIDI format or timing
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Timeline JSON could not be parsed
    #[error("timeline JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The parsed data violates the timeline contract
    #[error("invalid timeline: {0}")]
    Invalid(#[from] TimelineError),
}

/// Notes waiting for their note-off.
/// Key is (channel, pitch), value is start tick.
type ActiveNotes = HashMap<(u8, u8), u32>;

/// Microseconds in one minute, for converting MIDI tempo to BPM.
const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Imports Standard MIDI File data into a Timeline.
///
/// # Arguments
///
/// * `data` - Raw bytes of a .mid file
/// * `name` - Name to give the timeline (usually the file stem)
///
/// # Errors
///
/// Returns error if the data cannot be parsed, uses SMPTE timing, or is a
/// Format 2 (sequential) file
pub fn import_from_midi(data: &[u8], name: &str) -> Result<Timeline, ImportError> {
    let smf = Smf::parse(data).map_err(|e| ImportError::Parse(e.to_string()))?;

    let ppq = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int() as u32,
        Timing::Timecode(_, _) => {
            return Err(ImportError::UnsupportedFormat(
                "SMPTE timecode timing not supported".to_string(),
            ))
        }
    };

    if smf.header.format == Format::Sequential {
        return Err(ImportError::UnsupportedFormat(
            "Format 2 (sequential) MIDI files not supported".to_string(),
        ));
    }

    let mut timeline = Timeline::new(name, ppq);
    let mut previous_name = String::new();

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let chunk = parse_track(track, ppq);
        for tempo in chunk.tempos {
            timeline.add_tempo(tempo);
        }
        debug!(
            track = track_idx,
            name = %chunk.name,
            channels = chunk.tracks.len(),
            "parsed track chunk"
        );

        // Unnamed chunks inherit the previous chunk's name, which in format 1
        // files is often a conductor chunk without notes.
        let label = if chunk.name.is_empty() {
            previous_name.as_str()
        } else {
            chunk.name.as_str()
        };
        for mut parsed in chunk.tracks {
            parsed.name = label.to_string();
            timeline.add_track(parsed);
        }
        previous_name = chunk.name;
    }

    timeline.validate()?;

    info!(
        name,
        ppq,
        tracks = timeline.track_count(),
        notes = timeline.note_count(),
        tempos = timeline.tempos.len(),
        "imported MIDI file"
    );

    Ok(timeline)
}

/// Contents of one MIDI track chunk.
struct ParsedChunk {
    /// Last `TrackName` meta event in the chunk, or empty.
    name: String,
    tracks: Vec<SourceTrack>,
    tempos: Vec<TempoEntry>,
}

/// Parses a single MIDI track chunk into per-channel tracks plus its tempo
/// changes.
fn parse_track(track: &[midly::TrackEvent], ppq: u32) -> ParsedChunk {
    let mut channel_tracks: HashMap<u8, SourceTrack> = HashMap::new();
    let mut active_notes: ActiveNotes = HashMap::new();
    let mut tempos = Vec::new();
    let mut track_name = String::new();

    let mut current_tick: u32 = 0;

    for event in track {
        current_tick = current_tick.saturating_add(event.delta.as_int());

        match event.kind {
            TrackEventKind::Meta(MetaMessage::TrackName(name_bytes)) => {
                if let Ok(name) = std::str::from_utf8(name_bytes) {
                    track_name = name.to_string();
                }
            }
            TrackEventKind::Meta(MetaMessage::Tempo(tempo_val)) => {
                // tempo_val is microseconds per quarter note
                let usec_per_beat = tempo_val.as_int();
                if usec_per_beat > 0 {
                    tempos.push(TempoEntry::new(
                        current_tick,
                        MICROS_PER_MINUTE / usec_per_beat as f64,
                    ));
                }
            }
            TrackEventKind::Midi { channel, message } => {
                let ch = channel.as_int();
                let source = channel_tracks
                    .entry(ch)
                    .or_insert_with(|| SourceTrack::new(String::new(), ch));

                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        let pitch = key.as_int();
                        // Re-triggering a sounding note ends the previous one.
                        if let Some(start) = active_notes.insert((ch, pitch), current_tick) {
                            if current_tick > start {
                                source.create_note(pitch, start, current_tick - start, 0);
                            }
                        }
                    }
                    // Note on with velocity 0 = note off
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let pitch = key.as_int();
                        if let Some(start) = active_notes.remove(&(ch, pitch)) {
                            source.create_note(pitch, start, current_tick - start, 0);
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    // Close any remaining active notes (in case the file is incomplete)
    if !active_notes.is_empty() {
        warn!(
            count = active_notes.len(),
            "closing unterminated notes with a one-beat duration"
        );
        let mut dangling: Vec<_> = active_notes.into_iter().collect();
        dangling.sort_by_key(|&((ch, pitch), start)| (start, ch, pitch));
        for ((ch, pitch), start) in dangling {
            if let Some(source) = channel_tracks.get_mut(&ch) {
                source.create_note(pitch, start, ppq, 0);
            }
        }
    }

    let mut tracks: Vec<SourceTrack> = channel_tracks
        .into_values()
        .filter(|t| !t.is_empty())
        .collect();
    tracks.sort_by_key(|t| t.channel);

    ParsedChunk {
        name: track_name,
        tracks,
        tempos,
    }
}
