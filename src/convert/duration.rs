//! Single-byte exponent/mantissa duration encoding.
//!
//! The top `exponent_bits` bits of the byte hold a right-shift amount and
//! the remaining bits hold the shifted mantissa. Values below the mantissa
//! base are stored verbatim; larger values lose their low bits; values past
//! the largest exponent saturate to `0xFF`.
//!
//! The device never decodes back to exact milliseconds, and neither does
//! this crate for playback: reconstruction uses the duration retained next
//! to the encoded byte. [`decode8`] exists for inspection and testing.

/// Exponent width of the current record format.
pub const DEFAULT_EXPONENT_BITS: u8 = 3;

/// Valid exponent widths. At least one mantissa bit must remain.
pub const EXPONENT_BITS_RANGE: std::ops::RangeInclusive<u8> = 1..=7;

/// Encodes a duration into one byte.
///
/// `exponent_bits` must be within [`EXPONENT_BITS_RANGE`]; it is clamped
/// into that range otherwise.
///
/// # Examples
///
/// ```
/// use midi2notes::convert::encode8;
///
/// assert_eq!(encode8(17, 3), 17);
/// assert_eq!(encode8(500, 3), 0b011_11110);
/// ```
pub fn encode8(value: u32, exponent_bits: u8) -> u8 {
    let exponent_bits = clamp_bits(exponent_bits);
    let man_bits = 8 - exponent_bits as u32;
    let man_base = 1u32 << man_bits;
    let man_mask = man_base - 1;
    let exp_mask = (1u32 << exponent_bits) - 1;

    if value < man_base {
        return value as u8;
    }

    let msb = 31 - value.leading_zeros();
    let exponent = msb.saturating_sub(man_bits);
    if exponent > exp_mask {
        return u8::MAX;
    }

    ((exponent << man_bits) | ((value >> exponent) & man_mask)) as u8
}

/// Approximate inverse of [`encode8`].
///
/// Exponent 0 yields the mantissa itself; otherwise the implicit leading
/// bit is restored before shifting back.
pub fn decode8(byte: u8, exponent_bits: u8) -> u32 {
    let exponent_bits = clamp_bits(exponent_bits);
    let man_bits = 8 - exponent_bits as u32;
    let man_base = 1u32 << man_bits;
    let man_mask = man_base - 1;

    let exponent = byte as u32 >> man_bits;
    let mantissa = byte as u32 & man_mask;
    if exponent == 0 {
        return mantissa;
    }
    ((mantissa | man_base) as u64)
        .checked_shl(exponent)
        .filter(|v| *v <= u32::MAX as u64)
        .map_or(u32::MAX, |v| v as u32)
}

/// Largest value [`encode8`] can represent without saturating.
pub fn max_encodable(exponent_bits: u8) -> u32 {
    let low_bits = 1u32
        .checked_shl(decode_shift(exponent_bits))
        .map_or(u32::MAX, |b| b - 1);
    decode8(u8::MAX, exponent_bits) | low_bits
}

fn clamp_bits(exponent_bits: u8) -> u8 {
    exponent_bits.clamp(*EXPONENT_BITS_RANGE.start(), *EXPONENT_BITS_RANGE.end())
}

/// Shift applied by the largest exponent.
fn decode_shift(exponent_bits: u8) -> u32 {
    let exponent_bits = clamp_bits(exponent_bits);
    (1u32 << exponent_bits) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values_verbatim() {
        for v in 0..32 {
            assert_eq!(encode8(v, 3), v as u8);
            assert_eq!(decode8(v as u8, 3), v);
        }
    }

    #[test]
    fn test_quarter_note_at_120_bpm() {
        // 500 = 0b1_1111_0100, msb 8, exponent 3, mantissa (62 & 31) = 30
        assert_eq!(encode8(500, 3), (3 << 5) | 30);
        assert_eq!(decode8(encode8(500, 3), 3), 496);
    }

    #[test]
    fn test_reencode_is_stable() {
        for v in (0..20_000).step_by(7) {
            let byte = encode8(v, 3);
            assert_eq!(encode8(decode8(byte, 3), 3), byte, "value {v}");
        }
    }

    #[test]
    fn test_saturation() {
        assert_eq!(max_encodable(3), ((32 + 31) << 7) | 127);
        assert_eq!(encode8(max_encodable(3), 3), 0xFF);
        assert_eq!(encode8(max_encodable(3) + 1, 3), 0xFF);
        assert_eq!(encode8(u32::MAX, 3), 0xFF);
        assert_eq!(decode8(0xFF, 3), (32 + 31) << 7);
    }

    #[test]
    fn test_second_octave_drops_top_bit() {
        // msb == mantissa bits gives exponent 0, so bit 5 is masked away
        assert_eq!(encode8(32, 3), 0);
        assert_eq!(encode8(33, 3), 1);
        assert_eq!(encode8(63, 3), 31);
        for v in 32..64 {
            assert_eq!(encode8(v, 3), encode8(v - 32, 3), "value {v}");
            assert_eq!(decode8(encode8(v, 3), 3), v - 32);
        }
        // 64 is the first value that takes exponent 1
        assert_eq!(encode8(64, 3), 1 << 5);
    }

    #[test]
    fn test_monotonic_above_second_octave() {
        let mut last = encode8(64, 3);
        for v in 65..=max_encodable(3) + 100 {
            let byte = encode8(v, 3);
            assert!(byte >= last, "value {v}");
            last = byte;
        }
    }

    #[test]
    fn test_other_exponent_widths() {
        // 4 mantissa bits: values below 16 are exact
        assert_eq!(encode8(15, 4), 15);
        // 7 mantissa bits: values below 128 are exact
        assert_eq!(encode8(127, 1), 127);
        assert_eq!(encode8(256, 1), 0x80);
        assert_eq!(encode8(512, 1), 0xFF);
        assert_eq!(max_encodable(1), 511);
        // 1 mantissa bit: shifts beyond 32 bits saturate instead of overflowing
        assert_eq!(decode8(0xFF, 7), u32::MAX);
        assert_eq!(max_encodable(7), u32::MAX);
    }
}
