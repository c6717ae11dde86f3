/// Constants for OLE file format
pub mod consts;

/// Main OLE file parsing implementation
mod file;

/// Legacy code page decoding
pub mod codepage;

/// PLCF (Plex of Character Positions) parsing
pub mod plcf;

/// Legacy Word document (.doc) text extraction
///
/// This module provides functionality to extract text from Microsoft Word
/// documents in the legacy binary format (.doc files), which are OLE2-based
/// files.
pub mod doc;

// Re-export public types for convenient access
pub use file::{DirectoryEntry, OleError, OleFile, is_ole_file};
