//! midi2notes - MIDI to compact note-record conversion.
//!
//! This library turns parsed MIDI timelines into fixed-width 4-byte records
//! (pitch, encoded duration, 16-bit delay) for embedded players, renders
//! them as C headers or binary buffers, and rebuilds playable MIDI from them.

pub mod convert;
pub mod midi;
pub mod output;
pub mod session;

// Re-export commonly used types
pub use convert::{
    convert, CompactRecord, ConversionRequest, ConversionResult, ConvertError, ConvertOptions,
    ExportMode, NoteStream, TrackSelection,
};
pub use midi::{import_from_midi, ImportError, RawNoteEvent, SourceTrack, TempoEntry, Timeline};
pub use output::{reconstruct, render_binary, render_midi, render_text};
pub use session::Session;
