//! Splitting long delays into chains of 16-bit records.

use super::duration::encode8;
use super::record::{CompactRecord, MAX_RECORD_DELAY};
use serde::{Deserialize, Serialize};

/// What pitch continuation records in a delay chain carry.
///
/// Continuation records always have zero duration; only the pitch differs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainPitch {
    /// Repeat the note's pitch.
    #[default]
    Reuse,
    /// Use pitch 0 (a rest).
    Rest,
}

/// Emits the records for one note followed by `delay_ms` of time.
///
/// The first record carries the pitch and the encoded duration. While the
/// remaining delay is at least [`MAX_RECORD_DELAY`], another zero-duration
/// record follows, so a delay of exactly 65535 ends in a zero-delay link.
/// The delays of the chain always sum to `delay_ms` rounded.
///
/// Negative or non-finite inputs are treated as zero.
pub fn split_delay(
    pitch: u8,
    duration_ms: f64,
    delay_ms: f64,
    exponent_bits: u8,
    chain: ChainPitch,
) -> Vec<CompactRecord> {
    let duration = round_ms(duration_ms).min(u32::MAX as u64) as u32;
    let mut remaining = round_ms(delay_ms);

    let mut records = Vec::with_capacity(1 + (remaining / MAX_RECORD_DELAY as u64) as usize);
    records.push(CompactRecord::new(
        pitch,
        encode8(duration, exponent_bits),
        remaining.min(MAX_RECORD_DELAY as u64) as u16,
        duration,
    ));

    let link_pitch = match chain {
        ChainPitch::Reuse => pitch,
        ChainPitch::Rest => 0,
    };

    while remaining >= MAX_RECORD_DELAY as u64 {
        remaining -= MAX_RECORD_DELAY as u64;
        records.push(CompactRecord::new(
            link_pitch,
            0,
            remaining.min(MAX_RECORD_DELAY as u64) as u16,
            0,
        ));
    }

    if records.len() > 1 {
        tracing::debug!(pitch, links = records.len(), "split long delay");
    }

    records
}

fn round_ms(ms: f64) -> u64 {
    if ms.is_finite() && ms > 0.0 {
        ms.round() as u64
    } else {
        0
    }
}
