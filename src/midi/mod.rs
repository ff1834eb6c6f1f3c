//! MIDI-side data: parsed timelines and Standard MIDI File import/export.
//!
//! This module provides the input types for conversion (notes, tracks,
//! tempo changes) and the adapters between them and .mid files.

mod midi_export;
mod midi_import;
mod note;
mod timeline;
mod track;

pub use midi_export::{export_to_midi, ExportTrack, EXPORT_BPM, EXPORT_PPQ};
pub use midi_import::{import_from_midi, ImportError};
pub use note::RawNoteEvent;
pub use timeline::{TempoEntry, Timeline, TimelineError};
pub use track::{SourceTrack, DRUM_CHANNEL};

/// Tempo assumed when a timeline carries no tempo changes.
pub const DEFAULT_BPM: f64 = 120.0;

/// Standard MIDI note names for display purposes.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Converts a MIDI note number to a human-readable note name with octave.
///
/// # Examples
///
/// ```
/// use midi2notes::midi::note_to_name;
///
/// assert_eq!(note_to_name(60), "C4");
/// ```
pub fn note_to_name(note: u8) -> String {
    let octave = (note / 12) as i8 - 1; // MIDI octave convention
    let note_index = (note % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_to_name() {
        assert_eq!(note_to_name(60), "C4");
        assert_eq!(note_to_name(69), "A4");
        assert_eq!(note_to_name(0), "C-1");
        assert_eq!(note_to_name(127), "G9");
    }
}
