//! Document - the decoded text of a Word document and the structures it
//! was read from.
use super::container::{ByteSource, StreamContainer, WORD_DOCUMENT_STREAM};
use super::options::ExtractOptions;
use super::package::{DocError, Result};
use super::parts::fib::FileInformationBlock;
use super::parts::piece_table::{PieceRange, PieceTable};
use super::parts::text::{DecodeContext, decode_piece};
use log::{debug, trace};
use rayon::prelude::*;

/// A Word document (.doc).
///
/// Holds the parsed FIB and piece table alongside the extracted text.
///
/// # Examples
///
/// ```rust,no_run
/// use doc_text::doc::Package;
///
/// let mut pkg = Package::open("document.doc")?;
/// let doc = pkg.document()?;
///
/// println!("Word version: 0x{:04X}", doc.fib().version());
/// println!("Pieces: {}", doc.piece_table().len());
/// println!("{}", doc.text());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// File Information Block from WordDocument stream
    fib: FileInformationBlock,
    /// Piece table from the CLX in the table stream
    piece_table: PieceTable,
    /// Concatenated text of every piece
    text: String,
}

impl Document {
    /// Read and decode a document from the streams of `container`.
    ///
    /// All piece ranges are validated before any text is decoded, so a
    /// failure never yields partial text.
    pub fn from_container<C: StreamContainer>(
        container: &mut C,
        options: &ExtractOptions,
    ) -> Result<Self> {
        let word_document = container.open_stream(WORD_DOCUMENT_STREAM)?.ok_or_else(|| {
            DocError::MalformedHeader(format!("{} stream not found", WORD_DOCUMENT_STREAM))
        })?;
        let stream_len = word_document.len();

        let header = read_all(&word_document)?;
        let fib = FileInformationBlock::parse(&header)?;
        if fib.is_encrypted() {
            return Err(DocError::Encrypted);
        }

        let table_name = fib.table_stream_name();
        let table_stream = container
            .open_stream(table_name)?
            .ok_or_else(|| DocError::TableStreamMissing(table_name.to_string()))?;
        debug!(
            "Using table stream {} ({} bytes), WordDocument is {} bytes",
            table_name,
            table_stream.len(),
            stream_len
        );

        let table_bytes = read_all(&table_stream)?;
        let piece_table = PieceTable::parse(&table_bytes, fib.clx_offset(), fib.clx_length())?;
        let ranges = piece_table.ranges(stream_len)?;

        let ctx = DecodeContext::from_options(options);
        let text = if options.parallel {
            ranges
                .par_iter()
                .map(|range| decode_range(&word_document, range, &ctx))
                .collect::<Result<Vec<_>>>()?
                .concat()
        } else {
            ranges
                .iter()
                .map(|range| decode_range(&word_document, range, &ctx))
                .collect::<Result<Vec<_>>>()?
                .concat()
        };

        debug!(
            "Extracted {} characters from {} pieces",
            text.chars().count(),
            ranges.len()
        );

        Ok(Self {
            fib,
            piece_table,
            text,
        })
    }

    /// Get the extracted text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the document, returning its text.
    #[inline]
    pub fn into_text(self) -> String {
        self.text
    }

    /// Get the File Information Block.
    #[inline]
    pub fn fib(&self) -> &FileInformationBlock {
        &self.fib
    }

    /// Get the piece table.
    #[inline]
    pub fn piece_table(&self) -> &PieceTable {
        &self.piece_table
    }
}

/// Read a whole stream.
fn read_all<S: ByteSource>(stream: &S) -> Result<bytes::Bytes> {
    let len = usize::try_from(stream.len()).map_err(|_| DocError::ShortRead {
        offset: 0,
        expected: usize::MAX,
        actual: 0,
    })?;
    stream.read_at(0, len)
}

/// Read and decode one piece.
fn decode_range<S: ByteSource>(
    stream: &S,
    range: &PieceRange,
    ctx: &DecodeContext,
) -> Result<String> {
    trace!(
        "Piece {}: CP {}..{} bytes {}..{} {:?}",
        range.index,
        range.cp_start,
        range.cp_end,
        range.start,
        range.end(),
        range.encoding
    );
    let len = usize::try_from(range.len).map_err(|_| DocError::ShortRead {
        offset: range.start,
        expected: usize::MAX,
        actual: 0,
    })?;
    let bytes = stream.read_at(range.start, len)?;
    Ok(decode_piece(&bytes, range.encoding, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::doc::container::{StreamMap, TABLE_STREAM_0, TABLE_STREAM_1};

    const CLX_FC_OFFSET: usize = 154 + 33 * 8;
    const TEXT_START: u32 = 0x400;

    /// WordDocument stream with a minimal FIB pointing at a CLX of `clx_len`
    /// bytes at offset 0 of the table stream.
    fn word_document(flags: u16, clx_len: u32, body: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; TEXT_START as usize];
        data[0..2].copy_from_slice(&0xA5ECu16.to_le_bytes());
        data[2..4].copy_from_slice(&0x00C1u16.to_le_bytes());
        data[10..12].copy_from_slice(&flags.to_le_bytes());
        data[32..34].copy_from_slice(&14u16.to_le_bytes());
        data[62..64].copy_from_slice(&22u16.to_le_bytes());
        data[152..154].copy_from_slice(&93u16.to_le_bytes());
        data[CLX_FC_OFFSET + 4..CLX_FC_OFFSET + 8].copy_from_slice(&clx_len.to_le_bytes());
        data.extend_from_slice(body);
        data
    }

    fn clx(cps: &[u32], fcs: &[u32]) -> Vec<u8> {
        let mut plc = Vec::new();
        for cp in cps {
            plc.extend_from_slice(&cp.to_le_bytes());
        }
        for fc in fcs {
            plc.extend_from_slice(&[0, 0]);
            plc.extend_from_slice(&fc.to_le_bytes());
            plc.extend_from_slice(&[0, 0]);
        }
        let mut out = vec![0x02];
        out.extend_from_slice(&(plc.len() as u32).to_le_bytes());
        out.extend_from_slice(&plc);
        out
    }

    fn compressed_fc(offset: u32) -> u32 {
        0x4000_0000 | (offset * 2)
    }

    #[test]
    fn test_single_compressed_piece() {
        let table = clx(&[0, 5], &[compressed_fc(TEXT_START)]);
        let mut streams = StreamMap::new()
            .with_stream(
                WORD_DOCUMENT_STREAM,
                word_document(0x0200, table.len() as u32, b"Hello"),
            )
            .with_stream(TABLE_STREAM_1, table);

        let doc = Document::from_container(&mut streams, &ExtractOptions::default()).unwrap();
        assert_eq!(doc.text(), "Hello");
        assert_eq!(doc.piece_table().len(), 1);
        assert!(doc.fib().which_table_stream());
    }

    #[test]
    fn test_table_stream_selection() {
        let table = clx(&[0, 2], &[compressed_fc(TEXT_START)]);
        let mut streams = StreamMap::new()
            .with_stream(
                WORD_DOCUMENT_STREAM,
                word_document(0, table.len() as u32, b"ok"),
            )
            .with_stream(TABLE_STREAM_1, vec![0xFFu8; 4])
            .with_stream(TABLE_STREAM_0, table);

        let doc = Document::from_container(&mut streams, &ExtractOptions::default()).unwrap();
        assert_eq!(doc.into_text(), "ok");
    }

    #[test]
    fn test_encrypted_rejected() {
        let mut streams = StreamMap::new()
            .with_stream(WORD_DOCUMENT_STREAM, word_document(0x0100, 0, b""))
            .with_stream(TABLE_STREAM_0, vec![0u8; 8]);
        assert!(matches!(
            Document::from_container(&mut streams, &ExtractOptions::default()),
            Err(DocError::Encrypted)
        ));
    }

    #[test]
    fn test_missing_word_document() {
        let mut streams = StreamMap::new().with_stream(TABLE_STREAM_0, vec![0u8; 8]);
        assert!(matches!(
            Document::from_container(&mut streams, &ExtractOptions::default()),
            Err(DocError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_missing_table_stream() {
        let mut streams = StreamMap::new()
            .with_stream(WORD_DOCUMENT_STREAM, word_document(0x0200, 12, b""));
        match Document::from_container(&mut streams, &ExtractOptions::default()) {
            Err(DocError::TableStreamMissing(name)) => assert_eq!(name, "1Table"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_bounds_piece_aborts() {
        let table = clx(&[0, 3, 100], &[compressed_fc(TEXT_START), compressed_fc(TEXT_START + 3)]);
        let mut streams = StreamMap::new()
            .with_stream(
                WORD_DOCUMENT_STREAM,
                word_document(0, table.len() as u32, b"abc"),
            )
            .with_stream(TABLE_STREAM_0, table);
        assert!(matches!(
            Document::from_container(&mut streams, &ExtractOptions::default()),
            Err(DocError::PieceRangeOutOfBounds { piece: 1, .. })
        ));
    }
}
