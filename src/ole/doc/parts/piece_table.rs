//! Piece Table parser for DOC files.
//!
//! The piece table maps Character Positions (CP) to File Characters (FC)
//! in the WordDocument stream. It lives inside the CLX structure of the
//! table stream:
//!
//! - zero or more `Prc` blocks (`clxt = 0x01`, i16 size, grpprl) - skipped
//! - one `Pcdt` block (`clxt = 0x02`, u32 size, PlcPcd)
//!
//! `PlcPcd` is a PLCF of 8-byte piece descriptors (`Pcd`):
//! - Bytes 0-1: flags (fNoParaLast and reserved bits)
//! - Bytes 2-5: fc, with bit 30 as fCompressed
//! - Bytes 6-7: prm
//!
//! References:
//! - [MS-DOC] 2.9.38 Clx
//! - [MS-DOC] 2.9.177 Pcd
//! - [MS-DOC] 2.9.73 FcCompressed

use super::super::package::{DocError, Result};
use crate::common::binary::{read_i16_le, read_u8, read_u32_le, slice_at};
use crate::ole::plcf::PlcfParser;
use log::{debug, trace};

/// `clxt` of a `Prc` block
const CLXT_PRC: u8 = 0x01;
/// `clxt` of the `Pcdt` block
const CLXT_PCDT: u8 = 0x02;

/// Size of a Pcd in bytes
pub const PIECE_DESCRIPTOR_SIZE: usize = 8;

/// fCompressed bit of FcCompressed
const FC_COMPRESSED: u32 = 0x4000_0000;
/// The 30-bit fc field of FcCompressed
const FC_MASK: u32 = 0x3FFF_FFFF;

/// How the characters of a piece are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceEncoding {
    /// One byte per character (Windows-1252 style)
    Compressed,
    /// Two bytes per character (UTF-16LE code units)
    Uncompressed,
}

impl PieceEncoding {
    #[inline]
    pub fn bytes_per_char(self) -> u64 {
        match self {
            PieceEncoding::Compressed => 1,
            PieceEncoding::Uncompressed => 2,
        }
    }
}

/// A decoded piece descriptor: where a piece's bytes start and how they
/// are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceDescriptor {
    /// Byte offset in the WordDocument stream
    pub byte_offset: u32,
    pub encoding: PieceEncoding,
}

impl PieceDescriptor {
    /// Unpack a raw `FcCompressed` value.
    ///
    /// Compressed pieces store twice their byte offset.
    ///
    /// # Examples
    ///
    /// ```
    /// use doc_text::doc::parts::piece_table::{PieceDescriptor, PieceEncoding};
    ///
    /// let piece = PieceDescriptor::from_fc(0x4000_0800);
    /// assert_eq!(piece.encoding, PieceEncoding::Compressed);
    /// assert_eq!(piece.byte_offset, 0x400);
    ///
    /// let piece = PieceDescriptor::from_fc(0x0000_0800);
    /// assert_eq!(piece.encoding, PieceEncoding::Uncompressed);
    /// assert_eq!(piece.byte_offset, 0x800);
    /// ```
    pub fn from_fc(raw: u32) -> Self {
        let fc = raw & FC_MASK;
        if raw & FC_COMPRESSED != 0 {
            Self {
                byte_offset: fc / 2,
                encoding: PieceEncoding::Compressed,
            }
        } else {
            Self {
                byte_offset: fc,
                encoding: PieceEncoding::Uncompressed,
            }
        }
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.encoding == PieceEncoding::Compressed
    }
}

/// The byte range of one piece within the WordDocument stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceRange {
    /// Index of the piece in the table
    pub index: usize,
    pub cp_start: u32,
    pub cp_end: u32,
    /// First byte in the WordDocument stream
    pub start: u64,
    /// Length in bytes
    pub len: u64,
    pub encoding: PieceEncoding,
}

impl PieceRange {
    /// One past the last byte.
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.len
    }

    /// Number of characters in the piece.
    #[inline]
    pub fn char_count(&self) -> u32 {
        self.cp_end - self.cp_start
    }
}

/// Piece Table: N+1 character boundaries and N piece descriptors.
///
/// Piece `i` covers CPs `[boundaries[i], boundaries[i + 1])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceTable {
    boundaries: Vec<u32>,
    pieces: Vec<PieceDescriptor>,
}

impl PieceTable {
    /// Parse the piece table from the CLX at `clx_offset`/`clx_length` in
    /// the table stream.
    pub fn parse(table_stream: &[u8], clx_offset: u32, clx_length: u32) -> Result<Self> {
        if clx_length == 0 {
            return Err(DocError::InvalidPieceTable(
                "FIB declares an empty CLX".to_string(),
            ));
        }

        let clx = slice_at(table_stream, clx_offset as usize, clx_length as usize).map_err(|_| {
            DocError::InvalidPieceTable(format!(
                "CLX at {}+{} extends beyond table stream of {} bytes",
                clx_offset,
                clx_length,
                table_stream.len()
            ))
        })?;

        Self::parse_clx(clx)
    }

    /// Parse a CLX occupying exactly `clx`.
    ///
    /// Scanning stops at the first `Pcdt`; anything after it is ignored.
    pub fn parse_clx(clx: &[u8]) -> Result<Self> {
        let truncated = |what: &str, at: usize| {
            DocError::InvalidPieceTable(format!("CLX truncated reading {} at offset {}", what, at))
        };

        let mut offset = 0;
        let mut prc_count = 0usize;
        while offset < clx.len() {
            let clxt = read_u8(clx, offset).map_err(|_| truncated("clxt", offset))?;
            offset += 1;

            match clxt {
                CLXT_PRC => {
                    let size = read_i16_le(clx, offset).map_err(|_| truncated("Prc size", offset))?;
                    offset += 2;
                    let size = usize::try_from(size).map_err(|_| {
                        DocError::InvalidPieceTable(format!("Negative Prc size {}", size))
                    })?;
                    slice_at(clx, offset, size).map_err(|_| truncated("Prc data", offset))?;
                    offset += size;
                    prc_count += 1;
                },
                CLXT_PCDT => {
                    let lcb = read_u32_le(clx, offset).map_err(|_| truncated("Pcdt size", offset))?
                        as usize;
                    offset += 4;
                    let plc_pcd = slice_at(clx, offset, lcb).map_err(|_| {
                        DocError::InvalidPieceTable(format!(
                            "PlcPcd declares {} bytes but only {} remain",
                            lcb,
                            clx.len() - offset
                        ))
                    })?;
                    trace!("CLX: skipped {} Prc blocks, PlcPcd is {} bytes", prc_count, lcb);
                    return Self::parse_plc_pcd(plc_pcd);
                },
                other => {
                    return Err(DocError::InvalidPieceTable(format!(
                        "Unexpected CLX block type 0x{:02X} at offset {}",
                        other,
                        offset - 1
                    )));
                },
            }
        }

        Err(DocError::InvalidPieceTable(
            "CLX contains no piece table".to_string(),
        ))
    }

    /// Parse a `PlcPcd`: `(N+1)` CPs followed by `N` Pcds.
    fn parse_plc_pcd(data: &[u8]) -> Result<Self> {
        if PlcfParser::element_count(data.len(), PIECE_DESCRIPTOR_SIZE).is_none() {
            return Err(DocError::InvalidPieceTable(format!(
                "PlcPcd length {} does not hold a whole number of pieces",
                data.len()
            )));
        }
        let plcf = PlcfParser::parse(data, PIECE_DESCRIPTOR_SIZE)
            .map_err(|e| DocError::InvalidPieceTable(e.to_string()))?;

        let boundaries = plcf.positions().to_vec();
        if let Some(i) = boundaries.windows(2).position(|w| w[0] > w[1]) {
            return Err(DocError::InvalidPieceTable(format!(
                "Character positions decrease at piece {}: {} > {}",
                i,
                boundaries[i],
                boundaries[i + 1]
            )));
        }

        let pieces = (0..plcf.count())
            .map(|i| {
                let pcd = plcf.property(i).ok_or_else(|| {
                    DocError::InvalidPieceTable(format!("Missing descriptor for piece {}", i))
                })?;
                let fc = read_u32_le(pcd, 2).map_err(|e| DocError::InvalidPieceTable(e.to_string()))?;
                Ok(PieceDescriptor::from_fc(fc))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Piece table: {} pieces covering {} characters",
            pieces.len(),
            boundaries.last().copied().unwrap_or(0) - boundaries.first().copied().unwrap_or(0)
        );

        Ok(Self { boundaries, pieces })
    }

    /// Build a table from already-decoded parts.
    ///
    /// `boundaries` must hold one more entry than `pieces` and must not
    /// decrease.
    pub fn from_parts(boundaries: Vec<u32>, pieces: Vec<PieceDescriptor>) -> Result<Self> {
        if boundaries.len() != pieces.len() + 1 {
            return Err(DocError::InvalidPieceTable(format!(
                "{} boundaries for {} pieces",
                boundaries.len(),
                pieces.len()
            )));
        }
        if boundaries.windows(2).any(|w| w[0] > w[1]) {
            return Err(DocError::InvalidPieceTable(
                "Character positions decrease".to_string(),
            ));
        }
        Ok(Self { boundaries, pieces })
    }

    /// Number of pieces.
    #[inline]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// The N+1 character boundaries.
    #[inline]
    pub fn boundaries(&self) -> &[u32] {
        &self.boundaries
    }

    /// The N decoded piece descriptors.
    #[inline]
    pub fn pieces(&self) -> &[PieceDescriptor] {
        &self.pieces
    }

    /// Total number of characters covered by the table.
    pub fn total_cps(&self) -> u32 {
        match (self.boundaries.first(), self.boundaries.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0,
        }
    }

    /// Byte range of piece `index` in a WordDocument stream of `stream_len`
    /// bytes.
    ///
    /// Fails with [`DocError::PieceRangeOutOfBounds`] when the range runs
    /// past the end of the stream.
    pub fn range(&self, index: usize, stream_len: u64) -> Result<PieceRange> {
        let piece = self.pieces.get(index).ok_or_else(|| {
            DocError::InvalidPieceTable(format!(
                "Piece {} out of {} requested",
                index,
                self.pieces.len()
            ))
        })?;
        let cp_start = self.boundaries[index];
        let cp_end = self.boundaries[index + 1];

        let start = u64::from(piece.byte_offset);
        let len = u64::from(cp_end - cp_start) * piece.encoding.bytes_per_char();
        let end = start + len;

        if end > stream_len {
            return Err(DocError::PieceRangeOutOfBounds {
                piece: index,
                start,
                end,
                stream_len,
            });
        }

        Ok(PieceRange {
            index,
            cp_start,
            cp_end,
            start,
            len,
            encoding: piece.encoding,
        })
    }

    /// Byte ranges of every piece, in table order.
    pub fn ranges(&self, stream_len: u64) -> Result<Vec<PieceRange>> {
        (0..self.pieces.len())
            .map(|i| self.range(i, stream_len))
            .collect()
    }
}
