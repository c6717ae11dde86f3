use super::consts::*;
use log::{debug, trace};
use std::collections::HashSet;
use std::io::{self, Read, Seek, SeekFrom};
use thiserror::Error;
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw OLE header fields that the reader needs (first 76 bytes of the
/// 512-byte header; the header DIFAT array follows).
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
#[allow(dead_code)]
struct RawHeader {
    magic: [u8; 8],
    clsid: [u8; 16],
    minor_version: U16<LE>,
    dll_version: U16<LE>,
    byte_order: U16<LE>,
    sector_shift: U16<LE>,
    mini_sector_shift: U16<LE>,
    reserved: [u8; 6],
    num_dir_sectors: U32<LE>,
    num_fat_sectors: U32<LE>,
    first_dir_sector: U32<LE>,
    transaction_signature: U32<LE>,
    mini_stream_cutoff: U32<LE>,
    first_minifat_sector: U32<LE>,
    num_minifat_sectors: U32<LE>,
    first_difat_sector: U32<LE>,
    num_difat_sectors: U32<LE>,
}

/// Raw OLE directory entry structure (128 bytes)
///
/// This represents the on-disk format of a directory entry.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
#[allow(dead_code)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    /// Entry type (1 = storage, 2 = stream, 5 = root)
    entry_type: u8,
    /// Node color (0 = red, 1 = black)
    node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    state_bits: U32<LE>,
    creation_time: U64<LE>,
    modified_time: U64<LE>,
    start_sector: U32<LE>,
    stream_size: U64<LE>,
}

/// Error types for OLE file parsing
#[derive(Debug, Error)]
pub enum OleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Not an OLE file")]
    NotOleFile,
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),
    #[error("Stream not found")]
    StreamNotFound,
}

/// Represents an OLE directory entry (stream or storage)
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Storage ID (index in directory)
    pub sid: u32,
    /// Entry name (UTF-16 decoded to UTF-8)
    pub name: String,
    /// Entry type (stream, storage, root)
    pub entry_type: u8,
    pub sid_left: u32,
    pub sid_right: u32,
    pub sid_child: u32,
    /// First sector of the stream
    pub start_sector: u32,
    /// Size of the stream in bytes
    pub size: u64,
    /// Whether this stream lives in the mini stream
    pub is_minifat: bool,
}

/// OLE2 structured storage reader.
///
/// Parses the header, FAT, MiniFAT and directory of a compound file and
/// exposes its streams by path. Word documents keep their text in the
/// `WordDocument` stream and their piece table in `0Table` or `1Table`.
#[derive(Debug)]
pub struct OleFile<R: Read + Seek> {
    reader: R,
    file_size: u64,
    /// Sector size (512 or 4096 bytes)
    sector_size: usize,
    /// Mini sector size (typically 64 bytes)
    mini_sector_size: usize,
    /// Streams smaller than this live in the mini stream (typically 4096)
    mini_stream_cutoff: u32,
    /// File Allocation Table - maps sector to next sector in chain
    fat: Vec<u32>,
    minifat: Vec<u32>,
    first_dir_sector: u32,
    root: Option<DirectoryEntry>,
    /// All directory entries indexed by SID
    dir_entries: Vec<Option<DirectoryEntry>>,
    /// Mini stream data (loaded on first use)
    ministream: Option<Vec<u8>>,
}

impl<R: Read + Seek> OleFile<R> {
    /// Open and parse an OLE file from a reader.
    pub fn open(mut reader: R) -> Result<Self, OleError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        if file_size < MINIMAL_OLEFILE_SIZE as u64 {
            return Err(OleError::NotOleFile);
        }

        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let raw = RawHeader::read_from_prefix(&header)
            .map(|(raw, _)| raw)
            .map_err(|_| OleError::InvalidFormat("Truncated header".to_string()))?;

        if &raw.magic != MAGIC {
            return Err(OleError::NotOleFile);
        }
        if raw.byte_order.get() != 0xFFFE {
            return Err(OleError::InvalidFormat("Invalid byte order".to_string()));
        }

        let sector_shift = raw.sector_shift.get();
        let mini_sector_shift = raw.mini_sector_shift.get();
        if !(7..=16).contains(&sector_shift) || mini_sector_shift >= sector_shift {
            return Err(OleError::InvalidFormat(format!(
                "Unsupported sector shift {} / mini sector shift {}",
                sector_shift, mini_sector_shift
            )));
        }
        let sector_size = 1usize << sector_shift;
        let mini_sector_size = 1usize << mini_sector_shift;

        let dll_version = raw.dll_version.get();
        if (dll_version == 3 && sector_size != SECTOR_SIZE_V3)
            || (dll_version == 4 && sector_size != SECTOR_SIZE_V4)
        {
            return Err(OleError::InvalidFormat("Sector size mismatch".to_string()));
        }

        debug!(
            "OLE header: version {}, sector size {}, {} FAT sectors",
            dll_version,
            sector_size,
            raw.num_fat_sectors.get()
        );

        let mut ole = OleFile {
            reader,
            file_size,
            sector_size,
            mini_sector_size,
            mini_stream_cutoff: raw.mini_stream_cutoff.get(),
            fat: Vec::new(),
            minifat: Vec::new(),
            first_dir_sector: raw.first_dir_sector.get(),
            root: None,
            dir_entries: Vec::new(),
            ministream: None,
        };

        ole.load_fat(
            &header,
            raw.first_difat_sector.get(),
            raw.num_difat_sectors.get(),
        )?;
        ole.load_directory()?;
        if raw.num_minifat_sectors.get() > 0 {
            ole.load_minifat(raw.first_minifat_sector.get())?;
        }

        Ok(ole)
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Load the File Allocation Table.
    ///
    /// The first 109 FAT sector indexes live in the header; any further
    /// indexes are chained through DIFAT sectors.
    fn load_fat(
        &mut self,
        header: &[u8; HEADER_SIZE],
        first_difat_sector: u32,
        num_difat_sectors: u32,
    ) -> Result<(), OleError> {
        let mut fat_sectors = Vec::new();
        for chunk in header[0x4C..]
            .chunks_exact(4)
            .take(HEADER_DIFAT_ENTRIES)
        {
            let sector = read_sector_id(chunk);
            if sector == FREESECT || sector == ENDOFCHAIN {
                break;
            }
            fat_sectors.push(sector);
        }

        // Sectors the file can actually hold, header excluded
        let max_sectors = (self.file_size / self.sector_size as u64).saturating_sub(1) as usize;

        let mut difat_sector = first_difat_sector;
        let mut seen_difat = HashSet::new();
        let ids_per_sector = self.sector_size / 4 - 1;
        for _ in 0..(num_difat_sectors as usize).min(max_sectors) {
            if difat_sector == ENDOFCHAIN || difat_sector == FREESECT {
                break;
            }
            if !seen_difat.insert(difat_sector) {
                return Err(OleError::CorruptedFile("Cycle in DIFAT chain".to_string()));
            }
            let sector_data = self.read_sector(difat_sector)?;
            for chunk in sector_data.chunks_exact(4).take(ids_per_sector) {
                let sector = read_sector_id(chunk);
                if sector == FREESECT || sector == ENDOFCHAIN {
                    break;
                }
                fat_sectors.push(sector);
            }
            difat_sector = read_sector_id(&sector_data[ids_per_sector * 4..]);
        }

        if fat_sectors.len() > max_sectors {
            return Err(OleError::CorruptedFile(format!(
                "{} FAT sectors listed but the file holds only {} sectors",
                fat_sectors.len(),
                max_sectors
            )));
        }

        let ids_per_fat_sector = self.sector_size / 4;
        self.fat.reserve(fat_sectors.len() * ids_per_fat_sector);
        for sector_id in fat_sectors {
            let sector_data = self.read_sector(sector_id)?;
            self.fat
                .extend(sector_data.chunks_exact(4).map(read_sector_id));
        }

        trace!("Loaded FAT with {} entries", self.fat.len());
        Ok(())
    }

    fn load_minifat(&mut self, first_minifat_sector: u32) -> Result<(), OleError> {
        let minifat_data = self.read_stream_from_fat(first_minifat_sector)?;
        self.minifat = minifat_data.chunks_exact(4).map(read_sector_id).collect();
        trace!("Loaded MiniFAT with {} entries", self.minifat.len());
        Ok(())
    }

    fn load_directory(&mut self) -> Result<(), OleError> {
        let dir_data = self.read_stream_from_fat(self.first_dir_sector)?;

        let num_entries = dir_data.len() / DIRENTRY_SIZE;
        self.dir_entries = vec![None; num_entries];

        if num_entries == 0 {
            return Err(OleError::CorruptedFile("Empty directory".to_string()));
        }

        // The root entry is always SID 0
        let root = self.parse_directory_entry(&dir_data[..DIRENTRY_SIZE], 0)?;
        if root.entry_type != STGTY_ROOT {
            return Err(OleError::CorruptedFile(
                "First directory entry is not the root".to_string(),
            ));
        }
        let root_child_sid = root.sid_child;
        self.root = Some(root);

        self.build_storage_tree(root_child_sid, &dir_data, 0)
    }

    fn parse_directory_entry(&self, data: &[u8], sid: u32) -> Result<DirectoryEntry, OleError> {
        let raw = RawDirectoryEntry::read_from_bytes(data)
            .map_err(|_| OleError::InvalidFormat("Failed to parse directory entry".to_string()))?;

        let name_len = raw.name_len.get() as usize;
        let name = decode_entry_name(&raw.name[..name_len.saturating_sub(2).min(64)]);

        // Version 3 files only use the low 32 bits of the size
        let size = if self.sector_size == SECTOR_SIZE_V3 {
            raw.stream_size.get() & 0xFFFF_FFFF
        } else {
            raw.stream_size.get()
        };

        let is_minifat = size < self.mini_stream_cutoff as u64 && raw.entry_type == STGTY_STREAM;

        Ok(DirectoryEntry {
            sid,
            name,
            entry_type: raw.entry_type,
            sid_left: raw.sid_left.get(),
            sid_right: raw.sid_right.get(),
            sid_child: raw.sid_child.get(),
            start_sector: raw.start_sector.get(),
            size,
            is_minifat,
        })
    }

    /// Walk the red-black tree under `child_sid`, parsing every reachable entry.
    fn build_storage_tree(
        &mut self,
        child_sid: u32,
        dir_data: &[u8],
        depth: usize,
    ) -> Result<(), OleError> {
        if child_sid == NOSTREAM {
            return Ok(());
        }

        let sid = child_sid as usize;
        if sid >= self.dir_entries.len() || depth > self.dir_entries.len() {
            return Err(OleError::CorruptedFile(
                "Invalid directory entry index".to_string(),
            ));
        }
        if self.dir_entries[sid].is_some() {
            // Already visited; a well-formed tree never revisits a node
            return Ok(());
        }

        let offset = sid * DIRENTRY_SIZE;
        let entry = self.parse_directory_entry(&dir_data[offset..offset + DIRENTRY_SIZE], child_sid)?;
        let (left, right, child) = (entry.sid_left, entry.sid_right, entry.sid_child);
        self.dir_entries[sid] = Some(entry);

        self.build_storage_tree(left, dir_data, depth + 1)?;
        self.build_storage_tree(right, dir_data, depth + 1)?;
        self.build_storage_tree(child, dir_data, depth + 1)
    }

    fn read_sector(&mut self, sector_id: u32) -> Result<Vec<u8>, OleError> {
        // Sector 0 starts right after the header
        let position = (sector_id as u64 + 1) * self.sector_size as u64;
        if position + self.sector_size as u64 > self.file_size {
            return Err(OleError::CorruptedFile(format!(
                "Sector {} lies beyond end of file",
                sector_id
            )));
        }
        self.reader.seek(SeekFrom::Start(position))?;

        let mut buffer = vec![0u8; self.sector_size];
        self.reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn read_stream_from_fat(&mut self, start_sector: u32) -> Result<Vec<u8>, OleError> {
        let mut data = Vec::new();
        let mut sector = start_sector;
        let mut visited = 0usize;

        while sector != ENDOFCHAIN {
            if sector as usize >= self.fat.len() {
                return Err(OleError::CorruptedFile(
                    "Invalid sector index in FAT".to_string(),
                ));
            }
            visited += 1;
            if visited > self.fat.len() {
                return Err(OleError::CorruptedFile("Cycle in FAT chain".to_string()));
            }

            let sector_data = self.read_sector(sector)?;
            data.extend_from_slice(&sector_data);
            sector = self.fat[sector as usize];
        }

        Ok(data)
    }

    fn read_stream_from_minifat(
        &mut self,
        start_sector: u32,
        size: u64,
    ) -> Result<Vec<u8>, OleError> {
        if self.ministream.is_none() {
            let root_start = self
                .root
                .as_ref()
                .map(|root| root.start_sector)
                .ok_or_else(|| OleError::CorruptedFile("No root entry".to_string()))?;
            self.ministream = Some(self.read_stream_from_fat(root_start)?);
        }
        let ministream = self.ministream.as_deref().unwrap_or_default();

        let mut data = Vec::new();
        let mut sector = start_sector;
        let mut visited = 0usize;

        while sector != ENDOFCHAIN {
            if sector as usize >= self.minifat.len() {
                return Err(OleError::CorruptedFile(
                    "Invalid sector index in MiniFAT".to_string(),
                ));
            }
            visited += 1;
            if visited > self.minifat.len() {
                return Err(OleError::CorruptedFile("Cycle in MiniFAT chain".to_string()));
            }

            let position = sector as usize * self.mini_sector_size;
            let chunk = ministream
                .get(position..position + self.mini_sector_size)
                .ok_or_else(|| OleError::CorruptedFile("Mini sector out of bounds".to_string()))?;
            data.extend_from_slice(chunk);
            sector = self.minifat[sector as usize];
        }

        if (data.len() as u64) < size {
            return Err(OleError::CorruptedFile(format!(
                "MiniFAT chain holds {} bytes, stream declares {}",
                data.len(),
                size
            )));
        }
        data.truncate(size as usize);
        Ok(data)
    }

    /// List all streams in the OLE file as paths of storage/stream names.
    pub fn list_streams(&self) -> Vec<Vec<String>> {
        let mut streams = Vec::new();
        if let Some(root) = &self.root {
            self.collect_streams(root.sid_child, &[], &mut streams, 0);
        }
        streams
    }

    fn collect_streams(
        &self,
        sid: u32,
        path: &[String],
        streams: &mut Vec<Vec<String>>,
        depth: usize,
    ) {
        if depth > self.dir_entries.len() {
            return;
        }
        let Some(entry) = self.entry(sid) else {
            return;
        };

        self.collect_streams(entry.sid_left, path, streams, depth + 1);

        let mut current = path.to_vec();
        current.push(entry.name.clone());
        match entry.entry_type {
            STGTY_STREAM => streams.push(current),
            STGTY_STORAGE => self.collect_streams(entry.sid_child, &current, streams, depth + 1),
            _ => {},
        }

        self.collect_streams(entry.sid_right, path, streams, depth + 1);
    }

    /// Open a stream by path and return its contents.
    pub fn open_stream(&mut self, path: &[&str]) -> Result<Vec<u8>, OleError> {
        let entry = self.find_entry(path)?;

        if entry.entry_type != STGTY_STREAM {
            return Err(OleError::InvalidFormat("Not a stream".to_string()));
        }

        debug!(
            "Reading stream {:?} ({} bytes, {})",
            path,
            entry.size,
            if entry.is_minifat { "mini" } else { "regular" }
        );

        if entry.is_minifat {
            self.read_stream_from_minifat(entry.start_sector, entry.size)
        } else {
            let mut data = self.read_stream_from_fat(entry.start_sector)?;
            if (data.len() as u64) < entry.size {
                return Err(OleError::CorruptedFile(format!(
                    "Stream {:?} declares {} bytes but its chain holds {}",
                    path,
                    entry.size,
                    data.len()
                )));
            }
            data.truncate(entry.size as usize);
            Ok(data)
        }
    }

    /// Check if a stream or storage exists
    pub fn exists(&self, path: &[&str]) -> bool {
        self.find_entry(path).is_ok()
    }

    fn entry(&self, sid: u32) -> Option<&DirectoryEntry> {
        if sid == NOSTREAM {
            return None;
        }
        self.dir_entries.get(sid as usize)?.as_ref()
    }

    fn find_entry(&self, path: &[&str]) -> Result<DirectoryEntry, OleError> {
        let root = self.root.as_ref().ok_or(OleError::StreamNotFound)?;
        let mut current = root;

        for &name in path {
            current = self
                .find_child_by_name(current.sid_child, name, 0)
                .ok_or(OleError::StreamNotFound)?;
        }

        Ok(current.clone())
    }

    /// Search the sibling tree rooted at `sid`; names compare case-insensitively.
    fn find_child_by_name(&self, sid: u32, name: &str, depth: usize) -> Option<&DirectoryEntry> {
        if depth > self.dir_entries.len() {
            return None;
        }
        let entry = self.entry(sid)?;

        if entry.name.to_lowercase() == name.to_lowercase() {
            return Some(entry);
        }

        self.find_child_by_name(entry.sid_left, name, depth + 1)
            .or_else(|| self.find_child_by_name(entry.sid_right, name, depth + 1))
    }
}

#[inline]
fn read_sector_id(chunk: &[u8]) -> u32 {
    U32::<LE>::read_from_prefix(chunk)
        .map(|(v, _)| v.get())
        .unwrap_or(FREESECT)
}

fn decode_entry_name(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}

/// Check if a file/data is an OLE file by checking magic bytes
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= MINIMAL_OLEFILE_SIZE && &data[0..8] == MAGIC
}
