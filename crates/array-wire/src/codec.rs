//! Length-prefixed encoding of array messages over a byte stream.
//!
//! Layout per message, every integer a 4-byte little-endian `i32`:
//!
//! ```text
//! ┌────────┬──────────────────┬───────────┬─────────────┬──────────────┐
//! │ rank   │ shape[0..rank]   │ dtype_len │ dtype bytes │ payload      │
//! └────────┴──────────────────┴───────────┴─────────────┴──────────────┘
//! ```
//!
//! `rank == 0` is the sentinel; nothing follows it. Reads always obtain the
//! exact byte count or report [`WireError::ConnectionClosed`], so a peer
//! that vanishes mid-message is never mistaken for a malformed stream or a
//! clean sentinel.

use std::io::{self, Read, Write};

use crate::array::{ArrayMessage, TypedArray};
use crate::dtype::Dtype;
use crate::error::WireError;

/// Upper bound on rank; anything beyond this is a corrupt stream, not data.
const MAX_RANK: i32 = 32;
/// Dtype descriptors are three or four characters in practice.
const MAX_DTYPE_LEN: i32 = 64;
/// Upper bound on a single payload (a 4K RGB frame is ~25 MiB).
const MAX_PAYLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Encode one message. The writer is not flushed; senders flush once per
/// logical message group.
pub fn write_message<W: Write>(writer: &mut W, message: &ArrayMessage) -> Result<(), WireError> {
    let array = match message {
        ArrayMessage::Sentinel => {
            writer.write_all(&0i32.to_le_bytes())?;
            return Ok(());
        }
        ArrayMessage::Array(array) => array,
    };

    let rank = array.shape().len() as i32;
    writer.write_all(&rank.to_le_bytes())?;
    for &dim in array.shape() {
        writer.write_all(&(dim as i32).to_le_bytes())?;
    }
    let descriptor = array.dtype().to_string();
    writer.write_all(&(descriptor.len() as i32).to_le_bytes())?;
    writer.write_all(descriptor.as_bytes())?;
    writer.write_all(array.data())?;
    Ok(())
}

/// Decode one message, blocking until it is complete.
pub fn read_message<R: Read>(reader: &mut R) -> Result<ArrayMessage, WireError> {
    let rank = read_i32(reader)?;
    if rank == 0 {
        return Ok(ArrayMessage::Sentinel);
    }
    if !(1..=MAX_RANK).contains(&rank) {
        return Err(WireError::protocol(format!("unexpected rank {rank}")));
    }

    let mut shape = Vec::with_capacity(rank as usize);
    for axis in 0..rank {
        let dim = read_i32(reader)?;
        if dim < 0 {
            return Err(WireError::protocol(format!(
                "negative dimension {dim} at axis {axis}"
            )));
        }
        shape.push(dim as usize);
    }

    let dtype_len = read_i32(reader)?;
    if !(1..=MAX_DTYPE_LEN).contains(&dtype_len) {
        return Err(WireError::protocol(format!(
            "unexpected dtype length {dtype_len}"
        )));
    }
    let mut descriptor = vec![0u8; dtype_len as usize];
    read_exact_or_closed(reader, &mut descriptor)?;
    let descriptor = String::from_utf8(descriptor)
        .map_err(|_| WireError::protocol("dtype descriptor is not UTF-8"))?;
    let dtype = Dtype::parse(&descriptor)?;

    let elements: usize = shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| WireError::protocol("shape element count overflows"))?;
    let payload_len = elements
        .checked_mul(dtype.width())
        .ok_or_else(|| WireError::protocol("payload size overflows"))?;
    if payload_len > MAX_PAYLOAD_BYTES {
        return Err(WireError::protocol(format!(
            "payload of {payload_len} bytes exceeds limit"
        )));
    }

    let mut data = vec![0u8; payload_len];
    read_exact_or_closed(reader, &mut data)?;
    Ok(ArrayMessage::Array(TypedArray::new(shape, dtype, data)?))
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32, WireError> {
    let mut raw = [0u8; 4];
    read_exact_or_closed(reader, &mut raw)?;
    Ok(i32::from_le_bytes(raw))
}

/// `read_exact`, with EOF surfaced as the peer having gone away. `read_exact`
/// already loops over short reads, so a slow peer only ever blocks here.
fn read_exact_or_closed<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), WireError> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(WireError::ConnectionClosed),
        Err(err) => Err(WireError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn round_trip(array: TypedArray) -> TypedArray {
        let mut buf = Vec::new();
        write_message(&mut buf, &ArrayMessage::Array(array)).unwrap();
        match read_message(&mut Cursor::new(buf)).unwrap() {
            ArrayMessage::Array(decoded) => decoded,
            ArrayMessage::Sentinel => panic!("decoded a sentinel from an array"),
        }
    }

    #[test]
    fn round_trips_rank_one_to_three_at_all_widths() {
        let cases = vec![
            TypedArray::new(vec![7], Dtype::UINT8, (0..7).collect()).unwrap(),
            TypedArray::from_i64(vec![1], &[1_755_000_000_123]).unwrap(),
            TypedArray::from_f32(vec![2, 3], &[0.0, 1.5, -2.0, 3.25, 4.0, -5.5]).unwrap(),
            TypedArray::from_i64(vec![2, 4], &[1, 1, 2, 2, 10, 10, 20, 20]).unwrap(),
            TypedArray::rgb_image(4, 4, vec![0; 48]).unwrap(),
        ];
        for original in cases {
            let decoded = round_trip(original.clone());
            assert_eq!(decoded.shape(), original.shape());
            assert_eq!(decoded.dtype(), original.dtype());
            assert_eq!(decoded.data(), original.data());
        }
    }

    #[test]
    fn round_trips_zero_length_dimension() {
        // An empty detection set is shape (0, 4) with no payload.
        let decoded = round_trip(TypedArray::from_i64(vec![0, 4], &[]).unwrap());
        assert_eq!(decoded.shape(), &[0, 4]);
        assert!(decoded.data().is_empty());
    }

    #[test]
    fn sentinel_is_four_bytes_and_distinct() {
        let mut buf = Vec::new();
        write_message(&mut buf, &ArrayMessage::Sentinel).unwrap();
        assert_eq!(buf.len(), 4);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_message(&mut cursor).unwrap(), ArrayMessage::Sentinel);
        // Nothing consumed past the rank field.
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn sentinel_then_array_leaves_the_stream_aligned() {
        let array = TypedArray::from_i64(vec![1], &[42]).unwrap();
        let mut buf = Vec::new();
        write_message(&mut buf, &ArrayMessage::Sentinel).unwrap();
        write_message(&mut buf, &ArrayMessage::Array(array.clone())).unwrap();

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_message(&mut cursor).unwrap(), ArrayMessage::Sentinel);
        assert_eq!(
            read_message(&mut cursor).unwrap(),
            ArrayMessage::Array(array)
        );
    }

    #[test]
    fn empty_stream_reports_connection_closed() {
        let err = read_message(&mut Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }

    #[test]
    fn truncation_mid_message_reports_connection_closed() {
        let array = TypedArray::from_i64(vec![4], &[1, 2, 3, 4]).unwrap();
        let mut buf = Vec::new();
        write_message(&mut buf, &ArrayMessage::Array(array)).unwrap();

        // Cut at every prefix boundary: inside the header and inside the payload.
        for cut in [1, 4, 6, 8, 11, buf.len() - 1] {
            let err = read_message(&mut Cursor::new(buf[..cut].to_vec())).unwrap_err();
            assert!(
                matches!(err, WireError::ConnectionClosed),
                "cut at {cut} gave {err:?}"
            );
        }
    }

    #[test]
    fn negative_rank_is_a_protocol_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(-3i32).to_le_bytes());
        let err = read_message(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, WireError::Protocol { .. }));
    }

    #[test]
    fn absurd_rank_is_a_protocol_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1_000_000i32.to_le_bytes());
        let err = read_message(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, WireError::Protocol { .. }));
    }

    #[test]
    fn negative_dimension_is_a_protocol_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2i32.to_le_bytes());
        buf.extend_from_slice(&3i32.to_le_bytes());
        buf.extend_from_slice(&(-1i32).to_le_bytes());
        let err = read_message(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, WireError::Protocol { .. }));
    }

    #[test]
    fn garbage_dtype_is_a_protocol_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(&2i32.to_le_bytes());
        buf.extend_from_slice(b"zz");
        let err = read_message(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, WireError::Protocol { .. }));
    }
}
