//! Package implementation for legacy Word documents (.doc).

use super::super::{OleError, OleFile, is_ole_file};
use super::container::{StreamContainer, WORD_DOCUMENT_STREAM};
use super::document::Document;
use super::options::ExtractOptions;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::Path;
use thiserror::Error;

/// Error types for DOC text extraction.
///
/// Every variant aborts extraction of the whole document; there is no
/// partial-text result.
#[derive(Debug, Error)]
pub enum DocError {
    /// IO error while opening or buffering the input
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The compound container could not be opened or indexed
    #[error("Container unreadable: {0}")]
    ContainerUnreadable(#[from] OleError),
    /// The FIB is absent, truncated or internally inconsistent
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    /// The document is encrypted or obfuscated
    #[error("Document is encrypted")]
    Encrypted,
    /// The table stream selected by the FIB is not in the container
    #[error("Table stream missing: {0}")]
    TableStreamMissing(String),
    /// The CLX or the piece table inside it is structurally inconsistent
    #[error("Invalid piece table: {0}")]
    InvalidPieceTable(String),
    /// A piece's byte range runs past the end of the WordDocument stream
    #[error(
        "Piece {piece} byte range {start}..{end} exceeds WordDocument stream length {stream_len}"
    )]
    PieceRangeOutOfBounds {
        piece: usize,
        start: u64,
        end: u64,
        stream_len: u64,
    },
    /// A read returned fewer bytes than the declared range
    #[error("Short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },
}

/// Result type for DOC operations.
pub type Result<T> = std::result::Result<T, DocError>;

/// A Word (.doc) package.
///
/// This is the main entry point for working with legacy Word documents.
/// It wraps an OLE file and runs the text pipeline over its streams.
///
/// # Examples
///
/// ```rust,no_run
/// use doc_text::doc::Package;
///
/// let mut pkg = Package::open("document.doc")?;
/// let text = pkg.text()?;
/// println!("{}", text);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Package<R: Read + Seek = File> {
    ole: OleFile<R>,
    options: ExtractOptions,
}

impl Package<File> {
    /// Open a .doc package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Package::from_reader(file)
    }
}

impl Package<Cursor<Vec<u8>>> {
    /// Create a Package from an in-memory copy of the file.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if !is_ole_file(&bytes) {
            return Err(DocError::ContainerUnreadable(OleError::NotOleFile));
        }
        Package::from_reader(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> Package<R> {
    /// Create a Package from any reader that implements Read + Seek.
    pub fn from_reader(reader: R) -> Result<Self> {
        let ole = OleFile::open(reader)?;
        Self::from_ole_file(ole)
    }

    /// Create a Package from an already-parsed OLE file.
    ///
    /// Fails with [`DocError::MalformedHeader`] when the file has no
    /// WordDocument stream, since there is no FIB to read.
    pub fn from_ole_file(ole: OleFile<R>) -> Result<Self> {
        if !ole.exists(&[WORD_DOCUMENT_STREAM]) {
            return Err(DocError::MalformedHeader(
                "Not a valid Word document: WordDocument stream not found".to_string(),
            ));
        }

        Ok(Self {
            ole,
            options: ExtractOptions::default(),
        })
    }

    /// Replace the extraction options used by [`document`](Self::document)
    /// and [`text`](Self::text).
    #[inline]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse the document structures and decode its text.
    pub fn document(&mut self) -> Result<Document> {
        Document::from_container(&mut self.ole, &self.options)
    }

    /// Extract the document's plain text.
    pub fn text(&mut self) -> Result<String> {
        self.document().map(Document::into_text)
    }

    /// Get the underlying OLE file.
    #[inline]
    pub fn ole_file(&mut self) -> &mut OleFile<R> {
        &mut self.ole
    }
}

/// Extract the text of a `.doc` file from any reader.
///
/// The reader does not need to be seekable; its contents are buffered in
/// memory first.
pub fn extract_text_from_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Package::from_bytes(buffer)?.text()
}

/// Extract the text of a document held in any [`StreamContainer`].
pub fn extract_text<C: StreamContainer>(container: &mut C) -> Result<String> {
    extract_text_with_options(container, &ExtractOptions::default())
}

/// [`extract_text`] with explicit options.
pub fn extract_text_with_options<C: StreamContainer>(
    container: &mut C,
    options: &ExtractOptions,
) -> Result<String> {
    Document::from_container(container, options).map(Document::into_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_rejects_non_ole() {
        let result = Package::from_bytes(b"Not a DOC file".to_vec());
        assert!(matches!(
            result,
            Err(DocError::ContainerUnreadable(OleError::NotOleFile))
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let result = Package::open("definitely/not/here.doc");
        assert!(matches!(result, Err(DocError::Io(_))));
    }

    #[test]
    fn test_extract_text_from_reader_rejects_garbage() {
        let result = extract_text_from_reader(&b"plain text, not OLE"[..]);
        assert!(matches!(result, Err(DocError::ContainerUnreadable(_))));
    }

    #[test]
    fn test_error_messages() {
        let err = DocError::PieceRangeOutOfBounds {
            piece: 2,
            start: 10,
            end: 30,
            stream_len: 20,
        };
        assert_eq!(
            err.to_string(),
            "Piece 2 byte range 10..30 exceeds WordDocument stream length 20"
        );
        assert_eq!(
            DocError::TableStreamMissing("1Table".to_string()).to_string(),
            "Table stream missing: 1Table"
        );
    }
}
