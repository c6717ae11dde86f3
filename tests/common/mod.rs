//! Builders for synthetic Word documents and compound files.
#![allow(dead_code)]

use doc_text::ole::consts::{ENDOFCHAIN, FATSECT, FREESECT, MAGIC, NOSTREAM};

/// Offset of the first text byte in built WordDocument streams
pub const TEXT_START: usize = 0x400;

const SECTOR: usize = 512;
const MIN_REGULAR_STREAM: usize = 4096;

/// Text of one piece, in the encoding it is stored with.
#[derive(Debug, Clone)]
pub enum PieceText {
    /// Raw single-byte characters
    Compressed(Vec<u8>),
    /// UTF-16LE code units
    Unicode(Vec<u16>),
}

impl PieceText {
    pub fn ansi(bytes: &[u8]) -> Self {
        PieceText::Compressed(bytes.to_vec())
    }

    pub fn unicode(text: &str) -> Self {
        PieceText::Unicode(text.encode_utf16().collect())
    }

    fn char_count(&self) -> u32 {
        match self {
            PieceText::Compressed(bytes) => bytes.len() as u32,
            PieceText::Unicode(units) => units.len() as u32,
        }
    }
}

/// Builds the WordDocument and table streams of a document.
#[derive(Debug, Clone)]
pub struct DocBuilder {
    pieces: Vec<PieceText>,
    use_1table: bool,
    encrypted: bool,
    prc_blocks: usize,
    clx_offset: usize,
    stream_overrun: u32,
}

impl Default for DocBuilder {
    fn default() -> Self {
        Self {
            pieces: Vec::new(),
            use_1table: true,
            encrypted: false,
            prc_blocks: 0,
            clx_offset: 0,
            stream_overrun: 0,
        }
    }
}

/// The three streams of a built document.
#[derive(Debug, Clone)]
pub struct BuiltDoc {
    pub word_document: Vec<u8>,
    pub table_name: &'static str,
    pub table_stream: Vec<u8>,
}

impl DocBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn piece(mut self, text: PieceText) -> Self {
        self.pieces.push(text);
        self
    }

    pub fn use_0table(mut self) -> Self {
        self.use_1table = false;
        self
    }

    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    /// Prepend `count` property blocks to the CLX.
    pub fn prc_blocks(mut self, count: usize) -> Self {
        self.prc_blocks = count;
        self
    }

    /// Place the CLX this many bytes into the table stream.
    pub fn clx_offset(mut self, offset: usize) -> Self {
        self.clx_offset = offset;
        self
    }

    /// Claim this many extra characters for the last piece.
    pub fn overrun_last_piece(mut self, chars: u32) -> Self {
        self.stream_overrun = chars;
        self
    }

    pub fn build(&self) -> BuiltDoc {
        let mut word_document = fib(self.use_1table, self.encrypted);

        let mut cps = vec![0u32];
        let mut fcs = Vec::new();
        for piece in &self.pieces {
            let offset = word_document.len() as u32;
            match piece {
                PieceText::Compressed(bytes) => {
                    fcs.push(0x4000_0000 | (offset * 2));
                    word_document.extend_from_slice(bytes);
                },
                PieceText::Unicode(units) => {
                    fcs.push(offset);
                    word_document.extend(units.iter().flat_map(|u| u.to_le_bytes()));
                },
            }
            let last = *cps.last().unwrap_or(&0);
            cps.push(last + piece.char_count());
        }
        if let Some(last) = cps.last_mut() {
            *last += self.stream_overrun;
        }

        let mut clx = Vec::new();
        for i in 0..self.prc_blocks {
            clx.push(0x01);
            clx.extend_from_slice(&3i16.to_le_bytes());
            clx.extend_from_slice(&[i as u8, 0x2A, 0x00]);
        }
        clx.push(0x02);
        let plc_len = cps.len() * 4 + fcs.len() * 8;
        clx.extend_from_slice(&(plc_len as u32).to_le_bytes());
        for cp in &cps {
            clx.extend_from_slice(&cp.to_le_bytes());
        }
        for fc in &fcs {
            clx.extend_from_slice(&[0x40, 0x00]);
            clx.extend_from_slice(&fc.to_le_bytes());
            clx.extend_from_slice(&[0x00, 0x00]);
        }

        let mut table_stream = vec![0u8; self.clx_offset];
        table_stream.extend_from_slice(&clx);

        set_clx_pointer(&mut word_document, self.clx_offset as u32, clx.len() as u32);

        BuiltDoc {
            word_document,
            table_name: if self.use_1table { "1Table" } else { "0Table" },
            table_stream,
        }
    }
}

/// Byte offset of `fcClx` in a FIB with the standard Word 97 counts
const FC_CLX: usize = 154 + 33 * 8;

/// A Word 97 FIB padded to [`TEXT_START`] bytes.
fn fib(use_1table: bool, encrypted: bool) -> Vec<u8> {
    let mut data = vec![0u8; TEXT_START];
    data[0..2].copy_from_slice(&0xA5ECu16.to_le_bytes());
    data[2..4].copy_from_slice(&0x00C1u16.to_le_bytes());
    let mut flags = 0u16;
    if use_1table {
        flags |= 0x0200;
    }
    if encrypted {
        flags |= 0x0100;
    }
    data[10..12].copy_from_slice(&flags.to_le_bytes());
    // csw, cslw, cbRgFcLcb
    data[32..34].copy_from_slice(&14u16.to_le_bytes());
    data[62..64].copy_from_slice(&22u16.to_le_bytes());
    data[152..154].copy_from_slice(&93u16.to_le_bytes());
    data
}

fn set_clx_pointer(word_document: &mut [u8], fc: u32, lcb: u32) {
    word_document[FC_CLX..FC_CLX + 4].copy_from_slice(&fc.to_le_bytes());
    word_document[FC_CLX + 4..FC_CLX + 8].copy_from_slice(&lcb.to_le_bytes());
}

/// Build a version 3 compound file holding `streams` at the root.
///
/// Streams are zero-padded to the mini stream cutoff so they all live in
/// regular sectors.
pub fn compound_file(streams: &[(&str, &[u8])]) -> Vec<u8> {
    assert!(streams.len() < 4, "one directory sector holds four entries");

    let padded: Vec<Vec<u8>> = streams
        .iter()
        .map(|(_, data)| {
            let mut data = data.to_vec();
            if data.len() < MIN_REGULAR_STREAM {
                data.resize(MIN_REGULAR_STREAM, 0);
            }
            data
        })
        .collect();

    // Sector 0: FAT, sector 1: directory, then each stream in turn
    let mut fat = vec![FATSECT, ENDOFCHAIN];
    let mut starts = Vec::new();
    for data in &padded {
        let sectors = data.len().div_ceil(SECTOR);
        let first = fat.len() as u32;
        starts.push(first);
        for i in 0..sectors as u32 {
            fat.push(if i + 1 == sectors as u32 { ENDOFCHAIN } else { first + i + 1 });
        }
    }
    assert!(fat.len() <= SECTOR / 4, "streams too large for one FAT sector");
    fat.resize(SECTOR / 4, FREESECT);

    let mut header = vec![0u8; SECTOR];
    header[0..8].copy_from_slice(MAGIC);
    header[0x18..0x1A].copy_from_slice(&0x003Eu16.to_le_bytes());
    header[0x1A..0x1C].copy_from_slice(&3u16.to_le_bytes());
    header[0x1C..0x1E].copy_from_slice(&0xFFFEu16.to_le_bytes());
    header[0x1E..0x20].copy_from_slice(&9u16.to_le_bytes());
    header[0x20..0x22].copy_from_slice(&6u16.to_le_bytes());
    header[0x2C..0x30].copy_from_slice(&1u32.to_le_bytes());
    header[0x30..0x34].copy_from_slice(&1u32.to_le_bytes());
    header[0x38..0x3C].copy_from_slice(&(MIN_REGULAR_STREAM as u32).to_le_bytes());
    header[0x3C..0x40].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
    header[0x44..0x48].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
    header[0x4C..0x50].copy_from_slice(&0u32.to_le_bytes());
    for slot in header[0x50..].chunks_exact_mut(4) {
        slot.copy_from_slice(&FREESECT.to_le_bytes());
    }

    let mut directory = vec![0u8; SECTOR];
    let child = if streams.is_empty() { NOSTREAM } else { 1 };
    write_entry(&mut directory[0..128], "Root Entry", 5, NOSTREAM, child, ENDOFCHAIN, 0);
    for (i, ((name, _), data)) in streams.iter().zip(&padded).enumerate() {
        let sid = i + 1;
        let right = if sid < streams.len() { sid as u32 + 1 } else { NOSTREAM };
        write_entry(
            &mut directory[sid * 128..(sid + 1) * 128],
            name,
            2,
            right,
            NOSTREAM,
            starts[i],
            data.len() as u64,
        );
    }

    let mut file = header;
    file.extend(fat.iter().flat_map(|id| id.to_le_bytes()));
    file.extend_from_slice(&directory);
    for data in &padded {
        let mut data = data.clone();
        data.resize(data.len().div_ceil(SECTOR) * SECTOR, 0);
        file.extend_from_slice(&data);
    }
    file
}

fn write_entry(
    slot: &mut [u8],
    name: &str,
    entry_type: u8,
    sid_right: u32,
    sid_child: u32,
    start_sector: u32,
    size: u64,
) {
    let units: Vec<u16> = name.encode_utf16().collect();
    for (i, unit) in units.iter().enumerate() {
        slot[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    slot[64..66].copy_from_slice(&(((units.len() + 1) * 2) as u16).to_le_bytes());
    slot[66] = entry_type;
    slot[67] = 1;
    slot[68..72].copy_from_slice(&NOSTREAM.to_le_bytes());
    slot[72..76].copy_from_slice(&sid_right.to_le_bytes());
    slot[76..80].copy_from_slice(&sid_child.to_le_bytes());
    slot[116..120].copy_from_slice(&start_sector.to_le_bytes());
    slot[120..128].copy_from_slice(&size.to_le_bytes());
}

/// A complete `.doc` file for `doc`.
pub fn doc_file(doc: &BuiltDoc) -> Vec<u8> {
    compound_file(&[
        ("WordDocument", doc.word_document.as_slice()),
        (doc.table_name, doc.table_stream.as_slice()),
    ])
}
