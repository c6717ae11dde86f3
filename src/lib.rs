//! doc-text - plain-text extraction from legacy Microsoft Word documents
//!
//! This library reads the binary `.doc` format (Word 97 and later) stored in
//! OLE2 compound files and returns the document's text.
//!
//! # Features
//!
//! - **OLE2 Parser**: Read the streams of a compound file
//! - **Piece table**: Follow the CLX to text stored in compressed or
//!   UTF-16 pieces, including fast-saved documents
//! - **Field codes**: Keep field results, drop field instructions
//! - **Pluggable containers**: Run the pipeline over any [`doc::StreamContainer`]
//! - **Parallel decoding**: Optionally decode pieces on the rayon pool
//!
//! # Example - Reading a DOC file
//!
//! ```no_run
//! use doc_text::doc::Package;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pkg = Package::open("document.doc")?;
//! let doc = pkg.document()?;
//! println!("Document text: {}", doc.text());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Streams from another reader
//!
//! ```no_run
//! use doc_text::doc::{StreamMap, extract_text};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let (word_document, table) = (Vec::<u8>::new(), Vec::<u8>::new());
//! let mut streams = StreamMap::new()
//!     .with_stream("WordDocument", word_document)
//!     .with_stream("1Table", table);
//! let text = extract_text(&mut streams)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Low-level OLE access
//!
//! ```no_run
//! use std::fs::File;
//! use doc_text::ole::OleFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = File::open("document.doc")?;
//! let mut ole = OleFile::open(file)?;
//!
//! for stream in ole.list_streams() {
//!     println!("Stream: {:?}", stream);
//! }
//!
//! let data = ole.open_stream(&["WordDocument"])?;
//! println!("Stream size: {} bytes", data.len());
//! # Ok(())
//! # }
//! ```

/// Common utilities shared by the parsers
pub mod common;

/// OLE2 (Object Linking and Embedding) file format parser
///
/// This module provides functionality to parse OLE2 structured storage files,
/// which are used by legacy Microsoft Office formats.
///
/// The `ole` module also contains the `doc` submodule for extracting text
/// from legacy Word documents, since .doc files are OLE2-based.
pub mod ole;

// Re-export commonly used types for convenience
pub use ole::doc;
pub use ole::doc::{
    DocError, Document, ExtractOptions, Package, extract_text, extract_text_from_reader,
    extract_text_with_options,
};
