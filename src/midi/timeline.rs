//! Parsed MIDI timeline container.
//!
//! A timeline is the input to every conversion: the per-track note lists,
//! the tempo-change list and the PPQ of the source file. It is produced by
//! [`import_from_midi`](super::import_from_midi) or loaded from JSON when an
//! external parser has already done the work.

use super::midi_import::ImportError;
use super::track::SourceTrack;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tempo change at a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEntry {
    /// Tick at which this tempo takes effect.
    pub ticks: u32,

    /// Tempo in beats (quarter notes) per minute.
    pub bpm: f64,
}

impl TempoEntry {
    pub fn new(ticks: u32, bpm: f64) -> Self {
        Self { ticks, bpm }
    }
}

/// Contract violations found in a timeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("PPQ must be greater than zero")]
    ZeroPpq,

    #[error("tempo at tick {ticks} has invalid BPM {bpm}")]
    InvalidBpm { ticks: u32, bpm: f64 },

    #[error("track {track} contains out-of-range pitch {pitch}")]
    InvalidPitch { track: usize, pitch: u8 },
}

/// A complete parsed timeline with multiple source tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Name of the source (usually the file stem).
    #[serde(default)]
    pub name: String,

    /// Ticks per quarter note.
    pub ppq: u32,

    /// Tempo changes, sorted by tick. May be empty.
    #[serde(default)]
    pub tempos: Vec<TempoEntry>,

    /// Source tracks in file order.
    #[serde(default)]
    tracks: Vec<SourceTrack>,
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new(name: impl Into<String>, ppq: u32) -> Self {
        Self {
            name: name.into(),
            ppq,
            tempos: Vec::new(),
            tracks: Vec::new(),
        }
    }

    /// Records a tempo change, keeping the list sorted by tick.
    ///
    /// A change at a tick that already has one replaces it.
    pub fn add_tempo(&mut self, entry: TempoEntry) {
        match self.tempos.binary_search_by_key(&entry.ticks, |t| t.ticks) {
            Ok(pos) => self.tempos[pos] = entry,
            Err(pos) => self.tempos.insert(pos, entry),
        }
    }

    /// Adds a track and returns its index.
    ///
    /// Every note in the track is re-stamped with that index.
    pub fn add_track(&mut self, mut track: SourceTrack) -> usize {
        let index = self.tracks.len();
        track.set_track_index(index);
        self.tracks.push(track);
        index
    }

    /// Returns all tracks in file order.
    pub fn tracks(&self) -> &[SourceTrack] {
        &self.tracks
    }

    /// Returns a track by index.
    pub fn track_at(&self, index: usize) -> Option<&SourceTrack> {
        self.tracks.get(index)
    }

    /// Returns the number of tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Returns the total number of notes across all tracks.
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.note_count()).sum()
    }

    /// Checks the input contract: non-zero PPQ, positive finite tempos and
    /// 7-bit pitches.
    ///
    /// Tick values are unsigned, so negative timing cannot be represented.
    pub fn validate(&self) -> Result<(), TimelineError> {
        if self.ppq == 0 {
            return Err(TimelineError::ZeroPpq);
        }
        if let Some(bad) = self
            .tempos
            .iter()
            .find(|t| !t.bpm.is_finite() || t.bpm <= 0.0)
        {
            return Err(TimelineError::InvalidBpm {
                ticks: bad.ticks,
                bpm: bad.bpm,
            });
        }
        for (index, track) in self.tracks.iter().enumerate() {
            if let Some(note) = track.notes().iter().find(|n| n.pitch > 127) {
                return Err(TimelineError::InvalidPitch {
                    track: index,
                    pitch: note.pitch,
                });
            }
        }
        Ok(())
    }

    /// Loads a timeline from JSON produced by an external parser.
    ///
    /// Tempo entries and notes are re-sorted, track indices are assigned
    /// from position, and the result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        let mut timeline: Timeline = serde_json::from_str(json)?;
        timeline.tempos.sort_by_key(|t| t.ticks);
        for (index, track) in timeline.tracks.iter_mut().enumerate() {
            track.sort_notes();
            track.set_track_index(index);
        }
        timeline.validate()?;
        Ok(timeline)
    }

    /// Serializes the timeline to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_tempo_sorted_and_replaced() {
        let mut timeline = Timeline::new("t", 480);
        timeline.add_tempo(TempoEntry::new(960, 90.0));
        timeline.add_tempo(TempoEntry::new(0, 120.0));
        timeline.add_tempo(TempoEntry::new(960, 100.0));

        assert_eq!(timeline.tempos.len(), 2);
        assert_eq!(timeline.tempos[0].ticks, 0);
        assert_eq!(timeline.tempos[1].bpm, 100.0);
    }

    #[test]
    fn test_add_track_stamps_index() {
        let mut timeline = Timeline::new("t", 480);
        timeline.add_track(SourceTrack::new("a", 0));
        let mut track = SourceTrack::new("b", 1);
        track.create_note(60, 0, 480, 99);
        let index = timeline.add_track(track);

        assert_eq!(index, 1);
        assert_eq!(timeline.track_at(1).unwrap().notes()[0].track_index, 1);
        assert_eq!(timeline.note_count(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert_eq!(
            Timeline::new("t", 0).validate(),
            Err(TimelineError::ZeroPpq)
        );

        let mut timeline = Timeline::new("t", 480);
        timeline.tempos.push(TempoEntry::new(0, 0.0));
        assert!(matches!(
            timeline.validate(),
            Err(TimelineError::InvalidBpm { ticks: 0, .. })
        ));

        let mut timeline = Timeline::new("t", 480);
        let mut track = SourceTrack::new("a", 0);
        track.create_note(200, 0, 10, 0);
        timeline.add_track(track);
        assert_eq!(
            timeline.validate(),
            Err(TimelineError::InvalidPitch {
                track: 0,
                pitch: 200
            })
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let mut timeline = Timeline::new("song", 480);
        timeline.add_tempo(TempoEntry::new(0, 140.0));
        let mut track = SourceTrack::new("Piano", 0);
        track.create_note(60, 0, 480, 0);
        timeline.add_track(track);

        let json = timeline.to_json().unwrap();
        let loaded = Timeline::from_json(&json).unwrap();
        assert_eq!(loaded, timeline);
    }

    #[test]
    fn test_json_sorts_and_indexes() {
        let json = r#"{
            "ppq": 96,
            "tracks": [
                { "notes": [] },
                { "name": "Bass", "channel": 1, "notes": [
                    { "pitch": 40, "start_ticks": 96, "duration_ticks": 48 },
                    { "pitch": 36, "start_ticks": 0, "duration_ticks": 48 }
                ] }
            ]
        }"#;
        let timeline = Timeline::from_json(json).unwrap();
        assert!(timeline.tempos.is_empty());
        let bass = timeline.track_at(1).unwrap();
        assert_eq!(bass.notes()[0].pitch, 36);
        assert!(bass.notes().iter().all(|n| n.track_index == 1));
    }

    #[test]
    fn test_json_invalid_is_error() {
        assert!(Timeline::from_json("{ not json").is_err());
        assert!(Timeline::from_json(r#"{ "ppq": 0 }"#).is_err());
    }
}
