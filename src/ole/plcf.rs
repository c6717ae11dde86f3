//! Property List with Character Positions (PLCF) parser.
//!
//! PLCF is the array layout Word uses throughout its table stream to map
//! character positions to fixed-size data elements. The piece table is one.

use crate::common::binary::{self, BinaryError, BinaryResult};
use bytes::Bytes;

/// Size in bytes of one character position in a PLCF.
pub const CP_SIZE: usize = 4;

/// Property List with Character Positions (PLCF).
///
/// # Format
///
/// - n+1 character positions (4 bytes each)
/// - n data elements (`element_size` bytes each)
///
/// # Examples
///
/// ```
/// use doc_text::ole::plcf::PlcfParser;
///
/// // CPs: 0, 10, 20 / elements: [1, 2], [3, 4]
/// let data = vec![
///     0x00, 0x00, 0x00, 0x00,
///     0x0A, 0x00, 0x00, 0x00,
///     0x14, 0x00, 0x00, 0x00,
///     0x01, 0x02,
///     0x03, 0x04,
/// ];
///
/// let plcf = PlcfParser::parse(&data, 2).unwrap();
/// assert_eq!(plcf.count(), 2);
/// assert_eq!(plcf.range(1), Some((10, 20)));
/// assert_eq!(plcf.property(0), Some(&[1u8, 2][..]));
/// ```
#[derive(Debug, Clone)]
pub struct PlcfParser {
    /// Character positions (CP array)
    positions: Vec<u32>,
    /// All data elements, back to back
    properties_data: Bytes,
    element_size: usize,
}

impl PlcfParser {
    /// Element count implied by a PLCF of `byte_len` bytes, or `None` when
    /// the length does not describe a whole number of elements.
    pub fn element_count(byte_len: usize, element_size: usize) -> Option<usize> {
        let stride = CP_SIZE + element_size;
        let body = byte_len.checked_sub(CP_SIZE)?;
        (element_size > 0 && body % stride == 0).then_some(body / stride)
    }

    /// Parse a PLCF occupying exactly `data`.
    ///
    /// Fails when `data` is not `4 + n * (4 + element_size)` bytes long.
    pub fn parse(data: &[u8], element_size: usize) -> BinaryResult<Self> {
        let n = Self::element_count(data.len(), element_size).ok_or_else(|| {
            BinaryError::ParseError(format!(
                "PLCF length {} is not 4 + n * {}",
                data.len(),
                CP_SIZE + element_size
            ))
        })?;

        let positions = (0..=n)
            .map(|i| binary::read_u32_le(data, i * CP_SIZE))
            .collect::<BinaryResult<Vec<u32>>>()?;

        let props_start = (n + 1) * CP_SIZE;
        let properties_data =
            Bytes::copy_from_slice(binary::slice_at(data, props_start, n * element_size)?);

        Ok(Self {
            positions,
            properties_data,
            element_size,
        })
    }

    /// Get the number of elements in the PLCF.
    #[inline]
    pub fn count(&self) -> usize {
        self.positions.len().saturating_sub(1)
    }

    /// Get character position at index (0..=count).
    #[inline]
    pub fn position(&self, index: usize) -> Option<u32> {
        self.positions.get(index).copied()
    }

    /// All character positions.
    #[inline]
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Get element data at index.
    #[inline]
    pub fn property(&self, index: usize) -> Option<&[u8]> {
        if index >= self.count() {
            return None;
        }
        let offset = index * self.element_size;
        self.properties_data.get(offset..offset + self.element_size)
    }

    /// Get the `(start_cp, end_cp)` range for element at index.
    pub fn range(&self, index: usize) -> Option<(u32, u32)> {
        if index >= self.count() {
            return None;
        }
        Some((self.positions[index], self.positions[index + 1]))
    }
}
