//! Codepage decoding utilities for legacy single-byte text runs.
//!
//! Compressed pieces in a Word document are single-byte text. Bytes above the
//! Windows-1252 special block carry no reliable encoding information, so the
//! text decoder offers them to a legacy multi-byte decoder as a best-effort
//! fallback. The decoder is backed by `encoding_rs` and selected by Windows
//! code page identifier.

use encoding_rs::Encoding;

/// Outcome of a best-effort legacy decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyDecode {
    /// The leading bytes decoded cleanly.
    Decoded {
        /// Decoded text
        text: String,
        /// Number of input bytes the text was decoded from
        consumed: usize,
    },
    /// Nothing could be decoded; the caller keeps the raw byte.
    PassThrough,
}

/// Decode one or more leading bytes of `bytes` with `encoding`.
///
/// Only the first byte is offered to the decoder, matching the
/// character-at-a-time walk of the text decoder. Lead bytes of a double-byte
/// encoding therefore come back as [`LegacyDecode::PassThrough`].
///
/// # Examples
///
/// ```
/// use doc_text::ole::codepage::{decode_one_or_more, LegacyDecode};
///
/// // 0xE9 is 'é' in Windows-1252
/// let result = decode_one_or_more(encoding_rs::WINDOWS_1252, &[0xE9, b'x']);
/// assert_eq!(result, LegacyDecode::Decoded { text: "é".to_string(), consumed: 1 });
///
/// // A lone GBK lead byte cannot be decoded
/// let result = decode_one_or_more(encoding_rs::GBK, &[0xC4]);
/// assert_eq!(result, LegacyDecode::PassThrough);
/// ```
pub fn decode_one_or_more(encoding: &'static Encoding, bytes: &[u8]) -> LegacyDecode {
    let Some(first) = bytes.first() else {
        return LegacyDecode::PassThrough;
    };

    match encoding.decode_without_bom_handling_and_without_replacement(std::slice::from_ref(first))
    {
        Some(text) if !text.is_empty() => LegacyDecode::Decoded {
            text: text.into_owned(),
            consumed: 1,
        },
        _ => LegacyDecode::PassThrough,
    }
}

/// Map Windows codepage identifier to encoding_rs Encoding
///
/// Returns `None` for code pages `encoding_rs` does not implement.
#[inline]
pub fn codepage_to_encoding(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        // DOS codepages
        437 => Some(encoding_rs::IBM866), // closest available to CP437

        // Windows codepages (Western scripts)
        874 => Some(encoding_rs::WINDOWS_874),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1252 => Some(encoding_rs::WINDOWS_1252),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        1258 => Some(encoding_rs::WINDOWS_1258),

        // East Asian codepages
        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK), // Simplified Chinese (GB2312/GBK)
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        20932 => Some(encoding_rs::EUC_JP),
        54936 => Some(encoding_rs::GB18030),

        // ISO 8859 series
        28592 => Some(encoding_rs::ISO_8859_2),
        28595 => Some(encoding_rs::ISO_8859_5),
        28597 => Some(encoding_rs::ISO_8859_7),
        28598 => Some(encoding_rs::ISO_8859_8),
        28605 => Some(encoding_rs::ISO_8859_15),

        10000 => Some(encoding_rs::MACINTOSH),
        20866 => Some(encoding_rs::KOI8_R),

        _ => None,
    }
}
