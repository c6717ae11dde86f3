//! Windows-1252 characters in the 0x80-0x9F block.
//!
//! Compressed pieces store text as single bytes. Outside ASCII, the only
//! bytes with a fixed meaning are the Windows-1252 additions below; bytes
//! 0x81, 0x8D, 0x8F, 0x90 and 0x9D are undefined there.

/// Map a Windows-1252 byte in the 0x80-0x9F block to its character.
///
/// Returns `None` for every byte outside that table.
///
/// # Examples
///
/// ```
/// use doc_text::doc::parts::charset::windows_1252_special;
///
/// assert_eq!(windows_1252_special(0x80), Some('€'));
/// assert_eq!(windows_1252_special(0x93), Some('\u{201C}'));
/// assert_eq!(windows_1252_special(0x81), None);
/// assert_eq!(windows_1252_special(b'A'), None);
/// ```
#[inline]
pub fn windows_1252_special(byte: u8) -> Option<char> {
    let ch = match byte {
        0x80 => '\u{20AC}', // Euro sign
        0x82 => '\u{201A}', // Single low-9 quotation mark
        0x83 => '\u{0192}', // Latin small f with hook
        0x84 => '\u{201E}', // Double low-9 quotation mark
        0x85 => '\u{2026}', // Horizontal ellipsis
        0x86 => '\u{2020}', // Dagger
        0x87 => '\u{2021}', // Double dagger
        0x88 => '\u{02C6}', // Modifier circumflex
        0x89 => '\u{2030}', // Per mille
        0x8A => '\u{0160}', // S caron
        0x8B => '\u{2039}', // Single left angle quotation mark
        0x8C => '\u{0152}', // OE ligature
        0x8E => '\u{017D}', // Z caron
        0x91 => '\u{2018}', // Left single quotation mark
        0x92 => '\u{2019}', // Right single quotation mark
        0x93 => '\u{201C}', // Left double quotation mark
        0x94 => '\u{201D}', // Right double quotation mark
        0x95 => '\u{2022}', // Bullet
        0x96 => '\u{2013}', // En dash
        0x97 => '\u{2014}', // Em dash
        0x98 => '\u{02DC}', // Small tilde
        0x99 => '\u{2122}', // Trade mark
        0x9A => '\u{0161}', // s caron
        0x9B => '\u{203A}', // Single right angle quotation mark
        0x9C => '\u{0153}', // oe ligature
        0x9E => '\u{017E}', // z caron
        0x9F => '\u{0178}', // Y diaeresis
        _ => return None,
    };
    Some(ch)
}
