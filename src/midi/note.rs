//! Raw note events as produced by a MIDI parser.
//!
//! A raw note is a single note-on/note-off pair with tick-based timing.
//! Notes are read-only once imported; every conversion works on borrowed
//! slices of them.

use serde::{Deserialize, Serialize};

/// A single note read from a source track.
///
/// Timing is expressed in ticks relative to the timeline's PPQ. The
/// `track_index` records which source track the note came from so merged
/// streams can still be traced back to their origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNoteEvent {
    /// MIDI note number (0-127). 60 = Middle C (C4).
    pub pitch: u8,

    /// Start time in ticks from the beginning of the timeline.
    pub start_ticks: u32,

    /// Duration in ticks.
    pub duration_ticks: u32,

    /// Index of the source track this note belongs to.
    #[serde(default)]
    pub track_index: usize,
}

impl RawNoteEvent {
    /// Creates a new note.
    ///
    /// # Arguments
    ///
    /// * `pitch` - MIDI note number (0-127)
    /// * `start_ticks` - Start position in ticks
    /// * `duration_ticks` - Duration in ticks
    /// * `track_index` - Index of the owning source track
    ///
    /// # Examples
    ///
    /// ```
    /// use midi2notes::midi::RawNoteEvent;
    ///
    /// // Middle C, one quarter note at 480 PPQ, on the first track
    /// let note = RawNoteEvent::new(60, 0, 480, 0);
    /// assert_eq!(note.duration_ticks, 480);
    /// ```
    pub fn new(pitch: u8, start_ticks: u32, duration_ticks: u32, track_index: usize) -> Self {
        Self {
            pitch,
            start_ticks,
            duration_ticks,
            track_index,
        }
    }
}
