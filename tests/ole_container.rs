mod common;

use common::{DocBuilder, PieceText, compound_file, doc_file};
use doc_text::doc::{DocError, ExtractOptions, Package, extract_text, extract_text_from_reader};
use doc_text::ole::{OleError, OleFile, is_ole_file};
use std::io::{Cursor, Write};

fn sample() -> common::BuiltDoc {
    DocBuilder::new()
        .piece(PieceText::ansi(b"Legacy "))
        .piece(PieceText::unicode("\u{201C}Word\u{201D} document\r"))
        .build()
}

#[test]
fn package_from_bytes() {
    let file = doc_file(&sample());
    assert!(is_ole_file(&file));

    let mut package = Package::from_bytes(file).unwrap();
    assert_eq!(
        package.text().unwrap(),
        "Legacy \u{201C}Word\u{201D} document\r"
    );
}

#[test]
fn package_document_details() {
    let mut package = Package::from_bytes(doc_file(&sample())).unwrap();
    let doc = package.document().unwrap();
    assert_eq!(doc.fib().version(), 0x00C1);
    assert_eq!(doc.fib().table_stream_name(), "1Table");
    assert_eq!(doc.piece_table().len(), 2);
    assert!(doc.piece_table().pieces()[0].is_compressed());
}

#[test]
fn package_open_from_disk() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&doc_file(&sample())).unwrap();
    tmp.flush().unwrap();

    let mut package = Package::open(tmp.path())
        .unwrap()
        .with_options(ExtractOptions::new().with_parallel(true));
    assert_eq!(
        package.text().unwrap(),
        "Legacy \u{201C}Word\u{201D} document\r"
    );
}

#[test]
fn reader_entry_point() {
    let file = doc_file(&sample());
    let text = extract_text_from_reader(Cursor::new(file)).unwrap();
    assert!(text.starts_with("Legacy "));
}

#[test]
fn ole_file_as_container() {
    let mut ole = OleFile::open(Cursor::new(doc_file(&sample()))).unwrap();
    let names: Vec<String> = ole.list_streams().into_iter().flatten().collect();
    assert_eq!(names, vec!["WordDocument".to_string(), "1Table".to_string()]);
    assert!(ole.exists(&["worddocument"]));

    assert_eq!(
        extract_text(&mut ole).unwrap(),
        "Legacy \u{201C}Word\u{201D} document\r"
    );
}

#[test]
fn padded_stream_length_bounds_pieces() {
    // Built streams are padded to 4096 bytes
    let doc = DocBuilder::new()
        .piece(PieceText::ansi(b"abc"))
        .overrun_last_piece(8192)
        .build();
    let mut package = Package::from_bytes(doc_file(&doc)).unwrap();
    assert!(matches!(
        package.text(),
        Err(DocError::PieceRangeOutOfBounds { piece: 0, stream_len: 4096, .. })
    ));
}

#[test]
fn missing_word_document_stream() {
    let file = compound_file(&[("1Table", &[0u8; 16][..])]);
    assert!(matches!(
        Package::from_bytes(file),
        Err(DocError::MalformedHeader(_))
    ));
}

#[test]
fn missing_table_stream_in_file() {
    let doc = sample();
    let file = compound_file(&[("WordDocument", doc.word_document.as_slice())]);
    let mut package = Package::from_bytes(file).unwrap();
    assert!(matches!(
        package.text(),
        Err(DocError::TableStreamMissing(_))
    ));
}

#[test]
fn not_a_compound_file() {
    assert!(matches!(
        Package::from_bytes(vec![0u8; 2048]),
        Err(DocError::ContainerUnreadable(OleError::NotOleFile))
    ));
}

#[test]
fn truncated_compound_file() {
    let mut file = doc_file(&sample());
    // Header, FAT and directory survive; the stream sectors do not
    file.truncate(1600);
    let mut package = Package::from_bytes(file).unwrap();
    assert!(matches!(
        package.text(),
        Err(DocError::ContainerUnreadable(OleError::CorruptedFile(_)))
    ));
}
