//! Access to the named streams of the surrounding container.
//!
//! The text pipeline only needs three streams from a `.doc` file. It reaches
//! them through [`StreamContainer`], so any compound-file reader can drive it.
//! [`OleFile`] is the built-in implementation; [`StreamMap`] holds streams that
//! are already in memory.

use super::package::{DocError, Result};
use crate::ole::{OleError, OleFile};
use bytes::Bytes;
use std::collections::HashMap;
use std::io::{Read, Seek};

/// Name of the main document stream (FIB and text)
pub const WORD_DOCUMENT_STREAM: &str = "WordDocument";
/// Table stream used when `fWhichTblStm` is clear
pub const TABLE_STREAM_0: &str = "0Table";
/// Table stream used when `fWhichTblStm` is set
pub const TABLE_STREAM_1: &str = "1Table";

/// A randomly addressable run of bytes.
pub trait ByteSource {
    /// Total length in bytes.
    fn len(&self) -> u64;

    /// Whether the source holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read exactly `length` bytes starting at `offset`.
    ///
    /// Fails with [`DocError::ShortRead`] when fewer bytes are available.
    fn read_at(&self, offset: u64, length: usize) -> Result<Bytes>;
}

impl ByteSource for Bytes {
    #[inline]
    fn len(&self) -> u64 {
        Bytes::len(self) as u64
    }

    fn read_at(&self, offset: u64, length: usize) -> Result<Bytes> {
        let available = (ByteSource::len(self)).saturating_sub(offset);
        let start = usize::try_from(offset).ok();
        match start.and_then(|s| s.checked_add(length).map(|e| (s, e))) {
            Some((s, e)) if e <= Bytes::len(self) => Ok(self.slice(s..e)),
            _ => Err(DocError::ShortRead {
                offset,
                expected: length,
                actual: available.min(length as u64) as usize,
            }),
        }
    }
}

impl ByteSource for Vec<u8> {
    #[inline]
    fn len(&self) -> u64 {
        Vec::len(self) as u64
    }

    fn read_at(&self, offset: u64, length: usize) -> Result<Bytes> {
        let available = (ByteSource::len(self)).saturating_sub(offset);
        usize::try_from(offset)
            .ok()
            .and_then(|s| self.get(s..s.checked_add(length)?))
            .map(Bytes::copy_from_slice)
            .ok_or(DocError::ShortRead {
                offset,
                expected: length,
                actual: available.min(length as u64) as usize,
            })
    }
}

/// A container exposing named streams.
pub trait StreamContainer {
    /// Stream type handed out by this container
    type Stream: ByteSource + Sync;

    /// Open a top-level stream by name.
    ///
    /// Returns `Ok(None)` when the stream does not exist and
    /// [`DocError::ContainerUnreadable`] when the container itself fails.
    fn open_stream(&mut self, name: &str) -> Result<Option<Self::Stream>>;
}

impl<R: Read + Seek> StreamContainer for OleFile<R> {
    type Stream = Bytes;

    fn open_stream(&mut self, name: &str) -> Result<Option<Bytes>> {
        match OleFile::open_stream(self, &[name]) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(OleError::StreamNotFound) => Ok(None),
            Err(err) => Err(DocError::ContainerUnreadable(err)),
        }
    }
}

impl<C: StreamContainer + ?Sized> StreamContainer for &mut C {
    type Stream = C::Stream;

    #[inline]
    fn open_stream(&mut self, name: &str) -> Result<Option<Self::Stream>> {
        (**self).open_stream(name)
    }
}

/// In-memory container of named streams.
///
/// Useful when the streams were already pulled out of a compound file by
/// another reader.
///
/// # Examples
///
/// ```
/// use doc_text::doc::StreamMap;
///
/// let streams = StreamMap::new()
///     .with_stream("WordDocument", vec![0u8; 512])
///     .with_stream("1Table", vec![0u8; 64]);
/// assert!(streams.contains("1Table"));
/// assert!(!streams.contains("0Table"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamMap {
    streams: HashMap<String, Bytes>,
}

impl StreamMap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a stream.
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Bytes>) {
        self.streams.insert(name.into(), data.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[inline]
    pub fn with_stream(mut self, name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.insert(name, data);
        self
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }
}

impl StreamContainer for StreamMap {
    type Stream = Bytes;

    fn open_stream(&mut self, name: &str) -> Result<Option<Bytes>> {
        Ok(self.streams.get(name).cloned())
    }
}
