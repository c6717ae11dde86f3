/// File Information Block (FIB) parser for DOC files.
///
/// The FIB is located at the beginning of the WordDocument stream and holds
/// the layout metadata the text pipeline needs:
/// - File format version and language
/// - Which table stream to use (0Table or 1Table)
/// - Where the CLX (piece table container) lives in that table stream
///
/// # Layout
///
/// - `FibBase`: 32 fixed bytes
/// - `csw` (u16) + `fibRgW` (`csw` 16-bit values)
/// - `cslw` (u16) + `fibRgLw` (`cslw` 32-bit values; `ccpText` is index 3)
/// - `cbRgFcLcb` (u16) + `fibRgFcLcb` (`cbRgFcLcb` pairs of 32-bit fc/lcb)
use super::super::package::{DocError, Result};
use crate::common::binary::{read_u16_le, read_u32_le, slice_at};
use log::{debug, warn};
use zerocopy::{FromBytes, LE, U16, U32};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Size of the fixed `FibBase` structure in bytes
pub const FIB_BASE_SIZE: usize = 32;

/// `wIdent` of a Word 97 or later binary document
pub const WORD_BINARY_IDENT: u16 = 0xA5EC;

/// Lowest `nFib` whose layout has a selectable table stream (Word 97)
pub const MIN_SUPPORTED_NFIB: u16 = 0x00C0;

/// Newest nFib written by any known Word version (Word 2010 and later)
const MAX_KNOWN_NFIB: u16 = 0x0112;

/// Index of `fcClx`/`lcbClx` in `fibRgFcLcb`
pub const CLX_POINTER_INDEX: usize = 33;

/// Index of `ccpText` in `fibRgLw`
const CCP_TEXT_INDEX: usize = 3;

// Bits of the flags word at offset 0x0A
const F_COMPLEX: u16 = 0x0004;
const F_ENCRYPTED: u16 = 0x0100;
const F_WHICH_TBL_STM: u16 = 0x0200;

/// On-disk `FibBase`.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
#[allow(dead_code)]
struct RawFibBase {
    w_ident: U16<LE>,
    n_fib: U16<LE>,
    unused: U16<LE>,
    lid: U16<LE>,
    pn_next: U16<LE>,
    flags: U16<LE>,
    n_fib_back: U16<LE>,
    l_key: U32<LE>,
    envr: u8,
    flags2: u8,
    reserved3: U16<LE>,
    reserved4: U16<LE>,
    reserved5: U32<LE>,
    reserved6: U32<LE>,
}

/// A `(fc, lcb)` pointer into the table stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FcLcb {
    /// Byte offset in the table stream
    pub fc: u32,
    /// Byte length
    pub lcb: u32,
}

/// File Information Block.
///
/// Parsed once per document and read-only afterwards.
#[derive(Debug, Clone)]
pub struct FileInformationBlock {
    nfib: u16,
    lid: u16,
    flags: u16,
    /// Character count of the main document text
    ccp_text: u32,
    /// `fcClx`/`lcbClx`
    clx: FcLcb,
}

impl FileInformationBlock {
    /// Parse a FIB from the WordDocument stream.
    ///
    /// Fails with [`DocError::MalformedHeader`] when the stream is too short
    /// for the header it declares, when `wIdent` is not a Word binary
    /// signature, or when `nFib` predates Word 97.
    pub fn parse(word_document: &[u8]) -> Result<Self> {
        let (base, _) = RawFibBase::read_from_prefix(word_document).map_err(|_| {
            DocError::MalformedHeader(format!(
                "WordDocument stream is {} bytes, FibBase needs {}",
                word_document.len(),
                FIB_BASE_SIZE
            ))
        })?;

        let ident = base.w_ident.get();
        if ident != WORD_BINARY_IDENT {
            return Err(DocError::MalformedHeader(format!(
                "Invalid FIB magic number: 0x{:04X}",
                ident
            )));
        }

        let nfib = base.n_fib.get();
        if nfib < MIN_SUPPORTED_NFIB {
            return Err(DocError::MalformedHeader(format!(
                "Unsupported FIB version 0x{:04X} (pre-Word 97)",
                nfib
            )));
        }
        if nfib > MAX_KNOWN_NFIB {
            warn!("FIB version 0x{:04X} is newer than any known Word release", nfib);
        }

        let truncated =
            |what: &str| DocError::MalformedHeader(format!("FIB truncated reading {}", what));

        // csw + fibRgW
        let mut offset = FIB_BASE_SIZE;
        let csw = read_u16_le(word_document, offset).map_err(|_| truncated("csw"))? as usize;
        offset += 2 + csw * 2;

        // cslw + fibRgLw
        let cslw = read_u16_le(word_document, offset).map_err(|_| truncated("cslw"))? as usize;
        let rg_lw = offset + 2;
        if cslw <= CCP_TEXT_INDEX {
            return Err(DocError::MalformedHeader(format!(
                "fibRgLw has {} entries, too few for ccpText",
                cslw
            )));
        }
        let ccp_text = read_u32_le(word_document, rg_lw + CCP_TEXT_INDEX * 4)
            .map_err(|_| truncated("ccpText"))?;
        offset = rg_lw + cslw * 4;

        // cbRgFcLcb + fibRgFcLcb
        let cb_rg_fc_lcb =
            read_u16_le(word_document, offset).map_err(|_| truncated("cbRgFcLcb"))? as usize;
        if cb_rg_fc_lcb <= CLX_POINTER_INDEX {
            return Err(DocError::MalformedHeader(format!(
                "fibRgFcLcb has {} entries, too few for fcClx",
                cb_rg_fc_lcb
            )));
        }
        let rg_fc_lcb = slice_at(word_document, offset + 2, cb_rg_fc_lcb * 8)
            .map_err(|_| truncated("fibRgFcLcb"))?;
        let clx_at = CLX_POINTER_INDEX * 8;
        let clx = FcLcb {
            fc: read_u32_le(rg_fc_lcb, clx_at).map_err(|_| truncated("fcClx"))?,
            lcb: read_u32_le(rg_fc_lcb, clx_at + 4).map_err(|_| truncated("lcbClx"))?,
        };

        let fib = Self {
            nfib,
            lid: base.lid.get(),
            flags: base.flags.get(),
            ccp_text,
            clx,
        };

        debug!(
            "FIB: nFib=0x{:04X} lid=0x{:04X} table={} clx={:?} ccpText={}",
            fib.nfib,
            fib.lid,
            fib.table_stream_name(),
            fib.clx(),
            fib.ccp_text
        );

        Ok(fib)
    }

    /// Get the file format version.
    ///
    /// Common values:
    /// - 0x00C1 (193): Word 97 through Word 2003
    /// - 0x0101 (257): Word 2007
    /// - 0x0112 (274): Word 2010+
    #[inline]
    pub fn version(&self) -> u16 {
        self.nfib
    }

    /// Get which table stream to use.
    ///
    /// Returns `true` for "1Table", `false` for "0Table".
    #[inline]
    pub fn which_table_stream(&self) -> bool {
        self.flags & F_WHICH_TBL_STM != 0
    }

    /// Name of the table stream this document uses.
    #[inline]
    pub fn table_stream_name(&self) -> &'static str {
        if self.which_table_stream() {
            super::super::container::TABLE_STREAM_1
        } else {
            super::super::container::TABLE_STREAM_0
        }
    }

    /// Check if the document is encrypted or obfuscated.
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.flags & F_ENCRYPTED != 0
    }

    /// Whether the last save was incremental (a "fast save").
    #[inline]
    pub fn is_complex(&self) -> bool {
        self.flags & F_COMPLEX != 0
    }

    /// Get the language ID.
    #[inline]
    pub fn language_id(&self) -> u16 {
        self.lid
    }

    /// Character count of the main document, excluding headers, footnotes
    /// and other sub-documents that follow it in the piece table.
    #[inline]
    pub fn main_text_len(&self) -> u32 {
        self.ccp_text
    }

    /// Location of the CLX in the table stream.
    #[inline]
    pub fn clx(&self) -> FcLcb {
        self.clx
    }

    /// Byte offset of the CLX in the table stream.
    #[inline]
    pub fn clx_offset(&self) -> u32 {
        self.clx().fc
    }

    /// Byte length of the CLX.
    #[inline]
    pub fn clx_length(&self) -> u32 {
        self.clx().lcb
    }
}
