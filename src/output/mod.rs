//! Renderers for conversion results.
//!
//! - [`render_text`]: C header with one table per export unit
//! - [`render_binary`] / [`parse_binary`]: raw little-endian record buffers
//! - [`reconstruct`] / [`render_midi`]: back to notes and a .mid file

mod binary;
mod reconstruct;
mod text;

pub use binary::{parse_binary, render_binary, COUNT_PREFIX_SIZE};
pub use reconstruct::{reconstruct, ReconstructedNote};
pub use text::render_text;

use crate::convert::{ConversionResult, ConvertError, ConvertOptions};
use crate::midi::{export_to_midi, ExportTrack};

/// One binary buffer per export unit, paired with the unit's identifier.
///
/// # Errors
///
/// Returns error if a unit is too long for its count prefix
pub fn render_binaries(
    result: &ConversionResult,
    options: &ConvertOptions,
) -> Result<Vec<(String, Vec<u8>)>, ConvertError> {
    result
        .units
        .iter()
        .map(|unit| {
            let data = render_binary(&unit.ident, &unit.stream, options.count_prefix)?;
            Ok((unit.ident.clone(), data))
        })
        .collect()
}

/// Reconstructs every export unit and writes them as one Standard MIDI File.
pub fn render_midi(result: &ConversionResult, name: &str, options: &ConvertOptions) -> Vec<u8> {
    let reconstructed: Vec<_> = result
        .units
        .iter()
        .map(|unit| reconstruct(&unit.stream))
        .collect();

    let tracks: Vec<ExportTrack<'_>> = result
        .units
        .iter()
        .zip(&reconstructed)
        .map(|(unit, notes)| ExportTrack {
            name: &unit.label,
            channel: unit.channel,
            notes,
        })
        .collect();

    export_to_midi(name, &tracks, options.release_gap_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{convert, ConversionRequest, TrackSelection};
    use crate::midi::{SourceTrack, Timeline};

    fn result() -> ConversionResult {
        let mut timeline = Timeline::new("song", 480);
        let mut lead = SourceTrack::new("Lead", 0);
        lead.create_note(60, 0, 480, 0);
        lead.create_note(64, 480, 480, 0);
        timeline.add_track(lead);
        let mut bass = SourceTrack::new("Bass", 1);
        bass.create_note(36, 0, 960, 0);
        timeline.add_track(bass);

        let options = ConvertOptions::default();
        let selection = TrackSelection::all();
        convert(&ConversionRequest::new(&timeline, &selection, &options)).unwrap()
    }

    #[test]
    fn test_render_binaries_per_unit() {
        let buffers = render_binaries(&result(), &ConvertOptions::default()).unwrap();
        let idents: Vec<_> = buffers.iter().map(|(ident, _)| ident.as_str()).collect();
        assert_eq!(idents, vec!["midi_1", "midi_2"]);
        assert_eq!(buffers[0].1.len(), COUNT_PREFIX_SIZE + 8);
        assert_eq!(buffers[1].1.len(), COUNT_PREFIX_SIZE + 4);
    }

    #[test]
    fn test_render_midi_has_track_per_unit() {
        let data = render_midi(&result(), "song", &ConvertOptions::default());
        let smf = midly::Smf::parse(&data).unwrap();
        assert_eq!(smf.tracks.len(), 3);
    }
}
