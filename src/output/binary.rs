//! Raw binary record buffers.
//!
//! Layout per record: pitch (u8), encoded duration (u8), delay (u16 LE).
//! A buffer may start with the record count as a u16 LE.

use crate::convert::{decode8, CompactRecord, ConvertError, NoteStream, RECORD_SIZE};

/// Size of the optional record count prefix.
pub const COUNT_PREFIX_SIZE: usize = 2;

/// Renders a stream as a little-endian buffer.
///
/// # Errors
///
/// Returns [`ConvertError::TooManyRecords`] if `count_prefix` is set and the
/// stream holds more records than a u16 can count
pub fn render_binary(
    ident: &str,
    stream: &NoteStream,
    count_prefix: bool,
) -> Result<Vec<u8>, ConvertError> {
    let mut out = Vec::with_capacity(COUNT_PREFIX_SIZE + stream.byte_size());

    if count_prefix {
        let count = u16::try_from(stream.len()).map_err(|_| ConvertError::TooManyRecords {
            ident: ident.to_string(),
            count: stream.len(),
        })?;
        out.extend_from_slice(&count.to_le_bytes());
    }

    for record in stream {
        out.extend_from_slice(&record.to_bytes());
    }

    Ok(out)
}

/// Reads a buffer produced by [`render_binary`] back into records.
///
/// The wire format does not carry exact durations, so each record's
/// `duration_ms` is the [`decode8`] approximation.
///
/// # Errors
///
/// Returns [`ConvertError::MalformedBinary`] if the buffer is truncated or
/// its count prefix disagrees with its length
pub fn parse_binary(
    data: &[u8],
    count_prefix: bool,
    exponent_bits: u8,
) -> Result<NoteStream, ConvertError> {
    let body = if count_prefix {
        let (count, body) = data
            .split_first_chunk::<COUNT_PREFIX_SIZE>()
            .ok_or_else(|| ConvertError::MalformedBinary("missing record count".to_string()))?;
        let expected = u16::from_le_bytes(*count) as usize * RECORD_SIZE;
        if body.len() != expected {
            return Err(ConvertError::MalformedBinary(format!(
                "count prefix says {} bytes of records, found {}",
                expected,
                body.len()
            )));
        }
        body
    } else {
        data
    };

    if body.len() % RECORD_SIZE != 0 {
        return Err(ConvertError::MalformedBinary(format!(
            "{} bytes is not a whole number of {}-byte records",
            body.len(),
            RECORD_SIZE
        )));
    }

    Ok(body
        .chunks_exact(RECORD_SIZE)
        .map(|chunk| {
            let duration8 = chunk[1];
            CompactRecord::new(
                chunk[0],
                duration8,
                u16::from_le_bytes([chunk[2], chunk[3]]),
                decode8(duration8, exponent_bits),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> NoteStream {
        [
            CompactRecord::new(60, 126, 500, 500),
            CompactRecord::new(0, 0, 0x0102, 0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_layout_with_count() {
        let data = render_binary("t", &stream(), true).unwrap();
        assert_eq!(
            data,
            vec![2, 0, 60, 126, 0xF4, 0x01, 0, 0, 0x02, 0x01]
        );
    }

    #[test]
    fn test_layout_without_count() {
        let data = render_binary("t", &stream(), false).unwrap();
        assert_eq!(data.len(), 8);
        assert_eq!(&data[..4], &[60, 126, 0xF4, 0x01]);
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(render_binary("t", &NoteStream::new(), true).unwrap(), vec![0, 0]);
        assert!(render_binary("t", &NoteStream::new(), false).unwrap().is_empty());
    }

    #[test]
    fn test_count_overflow() {
        let big: NoteStream = std::iter::repeat(CompactRecord::new(1, 1, 1, 1))
            .take(u16::MAX as usize + 1)
            .collect();
        let err = render_binary("big", &big, true).unwrap_err();
        assert_eq!(
            err,
            ConvertError::TooManyRecords {
                ident: "big".to_string(),
                count: 65536
            }
        );
        assert!(render_binary("big", &big, false).is_ok());
    }

    #[test]
    fn test_parse_back() {
        let data = render_binary("t", &stream(), true).unwrap();
        let parsed = parse_binary(&data, true, 3).unwrap();
        let wire: Vec<_> = parsed.iter().map(|r| r.to_bytes()).collect();
        let original: Vec<_> = stream().iter().map(|r| r.to_bytes()).collect();
        assert_eq!(wire, original);
        assert_eq!(parsed.records()[0].duration_ms, 496);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_binary(&[1], true, 3).is_err());
        assert!(parse_binary(&[2, 0, 60, 126, 0, 0], true, 3).is_err());
        assert!(parse_binary(&[60, 126, 0], false, 3).is_err());
    }
}
