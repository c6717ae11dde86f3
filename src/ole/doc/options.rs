/// Configuration for text extraction.
///
/// # Examples
///
/// ```rust
/// use doc_text::doc::ExtractOptions;
///
/// // Defaults: GBK fallback for unmapped high bytes, sequential decoding
/// let options = ExtractOptions::default();
///
/// // Or customize
/// let options = ExtractOptions::new()
///     .with_fallback_codepage(Some(1251))
///     .with_parallel(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Windows code page tried for single-byte characters `>= 0xA1` that the
    /// Windows-1252 table does not cover. `None` disables the fallback.
    pub fallback_codepage: Option<u32>,
    /// Decode pieces on the rayon thread pool instead of one at a time
    pub parallel: bool,
}

/// Simplified Chinese (GB2312/GBK)
pub const DEFAULT_FALLBACK_CODEPAGE: u32 = 936;

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            fallback_codepage: Some(DEFAULT_FALLBACK_CODEPAGE),
            parallel: false,
        }
    }
}

impl ExtractOptions {
    /// Create a new `ExtractOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback code page, or disable the fallback with `None`.
    ///
    /// Code pages unknown to `encoding_rs` also disable it.
    #[inline]
    pub fn with_fallback_codepage(mut self, codepage: Option<u32>) -> Self {
        self.fallback_codepage = codepage;
        self
    }

    /// Set whether pieces are decoded in parallel.
    ///
    /// Output is identical either way; pieces are joined in table order.
    #[inline]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
