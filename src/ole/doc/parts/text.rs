//! Text decoding for DOC pieces.
//!
//! Each piece of the piece table is decoded on its own:
//! - Compressed pieces hold one byte per character, read as Windows-1252
//!   with a configurable legacy code page for the remaining high bytes
//! - Uncompressed pieces hold UTF-16LE code units
//!
//! Both paths drop field instructions and non-printable controls, and turn
//! the table cell mark (0x07) into a space.
use super::super::options::ExtractOptions;
use super::charset::windows_1252_special;
use super::fields::{FieldBoundary, FieldState};
use super::piece_table::PieceEncoding;
use crate::ole::codepage::{LegacyDecode, codepage_to_encoding, decode_one_or_more};
use encoding_rs::Encoding;
use log::{trace, warn};

/// Table cell / row mark
const CELL_MARK: u32 = 0x07;
/// First byte handed to the legacy fallback decoder
const FALLBACK_START: u8 = 0xA1;

/// Shared, read-only decoding configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeContext {
    /// Legacy decoder for unmapped high bytes of compressed pieces
    pub fallback: Option<&'static Encoding>,
}

impl DecodeContext {
    /// Resolve the fallback code page of `options`.
    ///
    /// An unknown code page disables the fallback.
    pub fn from_options(options: &ExtractOptions) -> Self {
        let fallback = options.fallback_codepage.and_then(|codepage| {
            let encoding = codepage_to_encoding(codepage);
            if encoding.is_none() {
                warn!(
                    "Unsupported fallback code page {}, high bytes pass through unchanged",
                    codepage
                );
            }
            encoding
        });
        Self { fallback }
    }

    #[inline]
    pub fn with_fallback(fallback: Option<&'static Encoding>) -> Self {
        Self { fallback }
    }
}

/// What to do with one character value after control handling.
enum Control {
    /// A field marker or a dropped control
    Skip,
    /// Emit this character instead
    Emit(char),
    /// Not a control; translate normally
    Pass,
}

/// Apply field markers, instruction suppression and control filtering.
#[inline]
fn classify(code: u32, fields: &mut FieldState) -> Control {
    if let Some(boundary) = FieldBoundary::from_char_code(code) {
        fields.apply(boundary);
        return Control::Skip;
    }
    if fields.is_suppressing() {
        return Control::Skip;
    }
    match code {
        CELL_MARK => Control::Emit(' '),
        0x09 | 0x0A | 0x0D => Control::Pass,
        c if c < 0x20 => Control::Skip,
        _ => Control::Pass,
    }
}

/// Decode the bytes of one piece.
///
/// Never fails: undecodable content degrades to a substitute character.
///
/// # Examples
///
/// ```
/// use doc_text::doc::parts::piece_table::PieceEncoding;
/// use doc_text::doc::parts::text::{DecodeContext, decode_piece};
///
/// let bytes = [0x13, b'P', b'A', b'G', b'E', 0x14, b'7', 0x15];
/// let text = decode_piece(&bytes, PieceEncoding::Compressed, &DecodeContext::default());
/// assert_eq!(text, "7");
/// ```
pub fn decode_piece(bytes: &[u8], encoding: PieceEncoding, ctx: &DecodeContext) -> String {
    match encoding {
        PieceEncoding::Compressed => decode_compressed(bytes, ctx),
        PieceEncoding::Uncompressed => decode_uncompressed(bytes),
    }
}

/// Decode a compressed (single-byte) piece.
pub fn decode_compressed(bytes: &[u8], ctx: &DecodeContext) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut fields = FieldState::new();

    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        i += 1;

        match classify(u32::from(byte), &mut fields) {
            Control::Skip => continue,
            Control::Emit(ch) => {
                out.push(ch);
                continue;
            },
            Control::Pass => {},
        }

        if byte < 0x80 {
            out.push(char::from(byte));
        } else if let Some(ch) = windows_1252_special(byte) {
            out.push(ch);
        } else if byte >= FALLBACK_START
            && let Some(encoding) = ctx.fallback
        {
            match decode_one_or_more(encoding, &bytes[i - 1..]) {
                LegacyDecode::Decoded { text, consumed } => {
                    trace!(
                        "Fallback {} decoded 0x{:02X} as {:?}",
                        encoding.name(),
                        byte,
                        text
                    );
                    out.push_str(&text);
                    i += consumed.saturating_sub(1);
                },
                LegacyDecode::PassThrough => out.push(char::from(byte)),
            }
        } else {
            out.push(char::from(byte));
        }
    }

    out
}

/// Decode an uncompressed (UTF-16LE) piece.
///
/// Surrogate pairs combine within the piece; an unpaired surrogate becomes
/// U+FFFD. A trailing odd byte is ignored.
pub fn decode_uncompressed(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() / 2);
    let mut fields = FieldState::new();

    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));

    for unit in char::decode_utf16(units) {
        let (code, ch) = match unit {
            Ok(ch) => (u32::from(ch), ch),
            Err(_) => (u32::from(char::REPLACEMENT_CHARACTER), char::REPLACEMENT_CHARACTER),
        };

        match classify(code, &mut fields) {
            Control::Skip => {},
            Control::Emit(ch) => out.push(ch),
            Control::Pass => out.push(ch),
        }
    }

    out
}
