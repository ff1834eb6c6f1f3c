//! Retained conversion state for interactive front ends.
//!
//! A session keeps the last successfully loaded timeline and the user's
//! track selection, so toggling a track re-renders without re-parsing the
//! source. Conversion itself stays a pure call on an immutable request.

use crate::convert::{
    convert, ConversionRequest, ConversionResult, ConvertError, ConvertOptions, TrackSelection,
};
use crate::midi::{import_from_midi, ImportError, Timeline};
use tracing::info;

/// Loaded timeline, selection flags and options.
#[derive(Debug, Clone, Default)]
pub struct Session {
    timeline: Option<Timeline>,
    selection: TrackSelection,
    pub options: ConvertOptions,
}

impl Session {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            timeline: None,
            selection: TrackSelection::all(),
            options,
        }
    }

    /// Loads Standard MIDI File data.
    ///
    /// On success the timeline is replaced and every track is selected.
    /// On failure the session is left exactly as it was.
    pub fn load_midi(&mut self, data: &[u8], name: &str) -> Result<(), ImportError> {
        let timeline = import_from_midi(data, name)?;
        self.replace_timeline(timeline);
        Ok(())
    }

    /// Loads a timeline from JSON, with the same no-op-on-failure guarantee
    /// as [`load_midi`](Self::load_midi).
    pub fn load_json(&mut self, json: &str) -> Result<(), ImportError> {
        let timeline = Timeline::from_json(json)?;
        self.replace_timeline(timeline);
        Ok(())
    }

    /// Replaces the timeline and resets the selection.
    pub fn replace_timeline(&mut self, timeline: Timeline) {
        info!(
            name = %timeline.name,
            tracks = timeline.track_count(),
            "session timeline replaced"
        );
        self.timeline = Some(timeline);
        self.selection = TrackSelection::all();
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn selection(&self) -> &TrackSelection {
        &self.selection
    }

    /// Selects or deselects a track of the loaded timeline.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::UnknownTrack`] if the index is out of range
    pub fn set_selected(&mut self, index: usize, selected: bool) -> Result<(), ConvertError> {
        let count = self.timeline.as_ref().map_or(0, |t| t.track_count());
        if index >= count {
            return Err(ConvertError::UnknownTrack { index, count });
        }
        self.selection.set(index, selected);
        Ok(())
    }

    /// Converts the loaded timeline with the current selection.
    ///
    /// With no timeline loaded the result is empty.
    pub fn convert(&self) -> Result<ConversionResult, ConvertError> {
        match &self.timeline {
            Some(timeline) => convert(&ConversionRequest::new(
                timeline,
                &self.selection,
                &self.options,
            )),
            None => Ok(ConversionResult::default()),
        }
    }
}
