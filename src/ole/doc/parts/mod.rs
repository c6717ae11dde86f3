/// Internal parts for parsing DOC file structures.
///
/// This module contains parsers for the binary structures used in
/// legacy Word documents:
/// - FIB (File Information Block)
/// - Piece table (CLX)
/// - Field nesting and character mapping
/// - Piece text decoding
pub mod charset;
pub mod fib;
pub mod fields;
pub mod piece_table;
pub mod text;
