//! Timeline to compact-record conversion.
//!
//! The entry point is [`convert`], a pure function from an immutable
//! [`ConversionRequest`] to a [`ConversionResult`]. Nothing is retained
//! between calls; callers that re-render on selection changes keep the
//! timeline themselves (see [`Session`](crate::session::Session)).

mod delay;
mod duration;
mod options;
mod record;
mod selection;
mod stream;
mod tempo;

pub use delay::{split_delay, ChainPitch};
pub use duration::{
    decode8, encode8, max_encodable, DEFAULT_EXPONENT_BITS, EXPONENT_BITS_RANGE,
};
pub use options::{ConvertOptions, ExportMode};
pub use record::{CompactRecord, NoteStream, MAX_RECORD_DELAY, RECORD_SIZE};
pub use selection::TrackSelection;
pub use stream::build_stream;
pub use tempo::TempoMap;

use crate::midi::{SourceTrack, Timeline, TimelineError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors raised while converting or rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("invalid timeline: {0}")]
    InvalidTimeline(#[from] TimelineError),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("{ident} has {count} records; a count prefix holds at most 65535")]
    TooManyRecords { ident: String, count: usize },

    #[error("track {index} does not exist (timeline has {count} tracks)")]
    UnknownTrack { index: usize, count: usize },

    #[error("malformed binary buffer: {0}")]
    MalformedBinary(String),
}

/// Everything one conversion needs, borrowed immutably.
#[derive(Debug, Clone, Copy)]
pub struct ConversionRequest<'a> {
    pub timeline: &'a Timeline,
    pub selection: &'a TrackSelection,
    pub options: &'a ConvertOptions,
}

impl<'a> ConversionRequest<'a> {
    pub fn new(
        timeline: &'a Timeline,
        selection: &'a TrackSelection,
        options: &'a ConvertOptions,
    ) -> Self {
        Self {
            timeline,
            selection,
            options,
        }
    }
}

/// One exported table / buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportUnit {
    /// Human-readable description, used as the table comment.
    pub label: String,

    /// C identifier of the table.
    pub ident: String,

    /// MIDI channel of the unit (first source track's channel when merged).
    pub channel: u8,

    /// Indices of the source tracks that fed this unit.
    pub source_tracks: Vec<usize>,

    pub stream: NoteStream,
}

/// Output of one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionResult {
    pub units: Vec<ExportUnit>,
}

impl ConversionResult {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.units.iter().map(|u| u.stream.len()).sum()
    }

    /// Wire size of all units, without count prefixes.
    pub fn total_bytes(&self) -> usize {
        self.units.iter().map(|u| u.stream.byte_size()).sum()
    }
}

/// Converts the selected tracks of a timeline into compact record streams.
///
/// Unselected tracks and tracks without notes are skipped. With nothing
/// left to convert the result has no units, which is not an error.
///
/// # Errors
///
/// Returns error if the options or the timeline violate their contracts
pub fn convert(request: &ConversionRequest<'_>) -> Result<ConversionResult, ConvertError> {
    let ConversionRequest {
        timeline,
        selection,
        options,
    } = *request;

    options.validate()?;
    timeline.validate()?;

    let tempo = TempoMap::new(&timeline.tempos, timeline.ppq);

    let selected: Vec<(usize, &SourceTrack)> = timeline
        .tracks()
        .iter()
        .enumerate()
        .filter(|(index, track)| selection.is_selected(*index) && !track.is_empty())
        .collect();

    let units = match options.mode {
        ExportMode::PerTrack => per_track_units(&selected, &tempo, options),
        ExportMode::Merged => merged_unit(&selected, &tempo, options)
            .into_iter()
            .collect(),
    };

    for unit in &units {
        debug!(
            ident = %unit.ident,
            records = unit.stream.len(),
            bytes = unit.stream.byte_size(),
            "built export unit"
        );
    }

    Ok(ConversionResult { units })
}

fn per_track_units(
    selected: &[(usize, &SourceTrack)],
    tempo: &TempoMap,
    options: &ConvertOptions,
) -> Vec<ExportUnit> {
    let mut channel_uses: HashMap<u8, usize> = HashMap::new();
    for (_, track) in selected {
        *channel_uses.entry(track.channel).or_default() += 1;
    }

    selected
        .iter()
        .map(|&(index, track)| {
            let stream = build_stream(&[track], tempo, options.exponent_bits, options.chain_pitch);

            let display_channel = track.channel as u32 + 1;
            let ident = if channel_uses[&track.channel] > 1 {
                format!("{}_{}_{}", options.table_name, display_channel, index)
            } else {
                format!("{}_{}", options.table_name, display_channel)
            };

            let mut label = format!("{}: {}", display_channel, track_name(track));
            if track.is_drums() {
                label.push_str(" [drums]");
            }
            label.push_str(&format!(", {} bytes", stream.byte_size()));

            ExportUnit {
                label,
                ident,
                channel: track.channel,
                source_tracks: vec![index],
                stream,
            }
        })
        .collect()
}

fn merged_unit(
    selected: &[(usize, &SourceTrack)],
    tempo: &TempoMap,
    options: &ConvertOptions,
) -> Option<ExportUnit> {
    let (_, first) = selected.first()?;
    let tracks: Vec<&SourceTrack> = selected.iter().map(|(_, t)| *t).collect();
    let stream = build_stream(&tracks, tempo, options.exponent_bits, options.chain_pitch);

    Some(ExportUnit {
        label: format!(
            "Merged {} tracks, {} bytes",
            tracks.len(),
            stream.byte_size()
        ),
        ident: options.table_name.clone(),
        channel: first.channel,
        source_tracks: selected.iter().map(|(index, _)| *index).collect(),
        stream,
    })
}

fn track_name(track: &SourceTrack) -> &str {
    if track.name.is_empty() {
        "Unnamed"
    } else {
        &track.name
    }
}
