//! Binary data parsing utilities shared by the container reader and the
//! Word structure parsers.
//!
//! All multi-byte values in the OLE2 container and in Word binary structures
//! are little-endian. Reads are bounds-checked and report how much data was
//! expected versus available instead of panicking on short input.

use thiserror::Error;
use zerocopy::{FromBytes, I16, LE, U16, U32};

/// Binary parsing error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    #[error("Insufficient data: expected {expected}, got {available}")]
    InsufficientData { expected: usize, available: usize },
    /// Failed to parse the data
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Borrow `len` bytes starting at `offset`, failing if the range runs past
/// the end of `data`.
///
/// # Examples
///
/// ```
/// use doc_text::common::binary::slice_at;
/// let data = [1u8, 2, 3, 4];
/// assert_eq!(slice_at(&data, 1, 2).unwrap(), &[2, 3]);
/// assert!(slice_at(&data, 3, 2).is_err());
/// ```
#[inline]
pub fn slice_at(data: &[u8], offset: usize, len: usize) -> BinaryResult<&[u8]> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| BinaryError::ParseError("Offset overflow".to_string()))?;
    data.get(offset..end).ok_or(BinaryError::InsufficientData {
        expected: end,
        available: data.len(),
    })
}

/// Read a single byte at the given offset.
#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> BinaryResult<u8> {
    data.get(offset)
        .copied()
        .ok_or(BinaryError::InsufficientData {
            expected: offset + 1,
            available: data.len(),
        })
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use doc_text::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    let bytes = slice_at(data, offset, 2)?;
    U16::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u16".to_string()))
}

/// Read a little-endian i16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use doc_text::common::binary::read_i16_le;
/// let data = [0xFF, 0xFF];
/// assert_eq!(read_i16_le(&data, 0).unwrap(), -1i16);
/// ```
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> BinaryResult<i16> {
    let bytes = slice_at(data, offset, 2)?;
    I16::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read i16".to_string()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use doc_text::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    let bytes = slice_at(data, offset, 4)?;
    U32::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u32".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_le() {
        let data = [0x34, 0x12, 0x78, 0x56];
        assert_eq!(read_u16_le(&data, 0), Ok(0x1234));
        assert_eq!(read_u16_le(&data, 2), Ok(0x5678));
        assert_eq!(
            read_u16_le(&data, 3),
            Err(BinaryError::InsufficientData {
                expected: 5,
                available: 4
            })
        );
    }

    #[test]
    fn test_read_i16_le_negative() {
        let data = [0xFE, 0xFF];
        assert_eq!(read_i16_le(&data, 0), Ok(-2));
    }

    #[test]
    fn test_read_u32_le() {
        let data = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u32_le(&data, 0), Ok(0x12345678));
        assert!(read_u32_le(&data, 1).is_err());
    }

    #[test]
    fn test_read_u8_past_end() {
        assert_eq!(read_u8(&[7], 0), Ok(7));
        assert!(read_u8(&[7], 1).is_err());
    }

    #[test]
    fn test_slice_at_overflow() {
        let data = [0u8; 4];
        assert!(slice_at(&data, usize::MAX, 2).is_err());
    }
}
