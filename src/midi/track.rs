//! Source track representation.
//!
//! A source track holds the notes of one MIDI channel within one track
//! chunk of the input file, kept in chronological order.

use super::note::RawNoteEvent;
use serde::{Deserialize, Serialize};

/// General MIDI percussion channel (0-based).
pub const DRUM_CHANNEL: u8 = 9;

/// A single source track with its notes.
///
/// Notes are kept sorted by `start_ticks`. Notes with equal start ticks keep
/// the order in which they were added, which is what makes merged output
/// deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTrack {
    /// Track name as found in the file; may be empty.
    #[serde(default)]
    pub name: String,

    /// MIDI channel (0-15).
    #[serde(default)]
    pub channel: u8,

    /// Notes in this track, sorted by start_ticks.
    #[serde(default)]
    notes: Vec<RawNoteEvent>,
}

impl SourceTrack {
    /// Creates an empty track.
    ///
    /// # Arguments
    ///
    /// * `name` - Track name (may be empty)
    /// * `channel` - MIDI channel (0-15)
    pub fn new(name: impl Into<String>, channel: u8) -> Self {
        Self {
            name: name.into(),
            channel: channel.min(15),
            notes: Vec::new(),
        }
    }

    /// Adds a note, maintaining sorted order by start_ticks.
    ///
    /// A note is inserted after every existing note with the same start tick.
    pub fn add_note(&mut self, note: RawNoteEvent) {
        let pos = self
            .notes
            .partition_point(|n| n.start_ticks <= note.start_ticks);
        self.notes.insert(pos, note);
    }

    /// Creates and adds a note owned by `track_index`.
    pub fn create_note(
        &mut self,
        pitch: u8,
        start_ticks: u32,
        duration_ticks: u32,
        track_index: usize,
    ) {
        self.add_note(RawNoteEvent::new(
            pitch,
            start_ticks,
            duration_ticks,
            track_index,
        ));
    }

    /// Returns all notes in the track (sorted by start_ticks).
    pub fn notes(&self) -> &[RawNoteEvent] {
        &self.notes
    }

    /// Returns the number of notes in the track.
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Returns true if the track has no notes.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Whether this track plays on the General MIDI percussion channel.
    pub fn is_drums(&self) -> bool {
        self.channel == DRUM_CHANNEL
    }

    /// Re-stamps every note with the given track index.
    pub(crate) fn set_track_index(&mut self, index: usize) {
        for note in &mut self.notes {
            note.track_index = index;
        }
    }

    /// Restores sorted order after deserialization.
    pub(crate) fn sort_notes(&mut self) {
        self.notes.sort_by_key(|n| n.start_ticks);
    }
}
