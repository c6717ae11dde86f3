/// Word (.doc) text extraction.
///
/// This module extracts the plain text of Microsoft Word documents in the
/// legacy binary format (Word 97 through Word 2003 and the later `.doc`
/// writers), which are stored in OLE2 compound files.
///
/// # Architecture
///
/// The pipeline runs in fixed stages:
/// - `FileInformationBlock`: parsed from the start of the WordDocument stream
/// - Table selection: the FIB names `0Table` or `1Table`
/// - `PieceTable`: parsed from the CLX in the table stream
/// - Piece ranges: each piece mapped to a byte range of WordDocument
/// - Text decoding: each range decoded and the results concatenated
///
/// Streams come from any [`StreamContainer`]. [`Package`] wraps the built-in
/// OLE reader; [`StreamMap`] serves streams already held in memory.
///
/// # DOC File Structure
///
/// A .doc file is an OLE2 structured storage containing several streams:
/// - **WordDocument**: Main document stream containing the FIB and text
/// - **1Table** or **0Table**: Contains the piece table and formatting
///
/// # Example
///
/// ```rust,no_run
/// use doc_text::doc::{ExtractOptions, Package};
///
/// let mut package = Package::open("document.doc")?
///     .with_options(ExtractOptions::new().with_parallel(true));
/// let doc = package.document()?;
/// println!("Document text: {}", doc.text());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub mod container;
pub mod document;
pub mod options;
pub mod package;
pub mod parts;

pub use container::{
    ByteSource, StreamContainer, StreamMap, TABLE_STREAM_0, TABLE_STREAM_1, WORD_DOCUMENT_STREAM,
};
pub use document::Document;
pub use options::ExtractOptions;
pub use package::{
    DocError, Package, Result, extract_text, extract_text_from_reader, extract_text_with_options,
};
