//! Conversion settings.
//!
//! Options are plain serde data so they can be kept in a JSON file next to
//! a project and overridden from the command line.

use super::delay::ChainPitch;
use super::duration::{DEFAULT_EXPONENT_BITS, EXPONENT_BITS_RANGE};
use super::ConvertError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How selected tracks are grouped into export units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    /// One table / buffer per selected track.
    #[default]
    PerTrack,
    /// All selected tracks merged into one time-ordered table / buffer.
    Merged,
}

/// Settings for one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Width of the exponent field of the duration byte.
    pub exponent_bits: u8,

    /// Pitch carried by delay-chain continuation records.
    pub chain_pitch: ChainPitch,

    /// Per-track or merged export.
    pub mode: ExportMode,

    /// Base identifier for generated tables.
    pub table_name: String,

    /// Header included by the generated C source.
    pub header_include: String,

    /// Prefix binary buffers with a little-endian u16 record count.
    pub count_prefix: bool,

    /// Milliseconds cut from each note when exporting back to MIDI.
    pub release_gap_ms: u32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            exponent_bits: DEFAULT_EXPONENT_BITS,
            chain_pitch: ChainPitch::default(),
            mode: ExportMode::default(),
            table_name: "midi".to_string(),
            header_include: "MIDINote.h".to_string(),
            count_prefix: true,
            release_gap_ms: 2,
        }
    }
}

impl ConvertOptions {
    /// Checks that the options describe a representable format.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !EXPONENT_BITS_RANGE.contains(&self.exponent_bits) {
            return Err(ConvertError::InvalidOptions(format!(
                "exponent_bits must be in {}..={}, got {}",
                EXPONENT_BITS_RANGE.start(),
                EXPONENT_BITS_RANGE.end(),
                self.exponent_bits
            )));
        }
        if !is_identifier(&self.table_name) {
            return Err(ConvertError::InvalidOptions(format!(
                "table_name {:?} is not a C identifier",
                self.table_name
            )));
        }
        Ok(())
    }

    /// Parses options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConvertError> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| ConvertError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Loads options from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Saves options to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, json)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
