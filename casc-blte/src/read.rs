//! Seekable reader over a BLTE stream, decoding chunks on demand.

use std::io::{Read, Seek, SeekFrom};

use casc_crypto::KeyService;

use crate::frame::{decode_chunk, verify_chunk_checksum};
use crate::header::BLTEHeader;
use crate::{Error, Result};

/// A BLTE stream backed by a seekable reader (a file, an mmap cursor, or an
/// in-memory buffer).
///
/// `offset` is the position of the BLTE magic within `reader`; `length` is
/// the total size of the BLTE stream (header + all chunk data). Both are
/// needed because BLTE headers do not record their own encoded length for
/// single-chunk streams.
#[derive(Debug)]
pub struct BLTEFile<R> {
    reader: R,
    offset: u64,
    length: u64,
    header: BLTEHeader,
}

impl<R: Read + Seek> BLTEFile<R> {
    /// Parse the BLTE header at `offset` within `reader`.
    pub fn new(mut reader: R, offset: u64, length: u64) -> Result<Self> {
        reader.seek(SeekFrom::Start(offset))?;
        let header = BLTEHeader::parse(&mut reader)?;
        Ok(Self {
            reader,
            offset,
            length,
            header,
        })
    }

    /// The parsed BLTE header.
    pub fn header(&self) -> &BLTEHeader {
        &self.header
    }

    /// Number of chunks in this stream.
    pub fn chunk_count(&self) -> usize {
        self.header.chunk_count()
    }

    /// Total decompressed size, or 0 if unknown (single-chunk streams).
    pub fn total_decompressed_size(&self) -> u64 {
        self.header.total_decompressed_size()
    }

    fn chunk_span(&self, index: usize) -> Result<(u64, u64)> {
        let start = self
            .header
            .chunk_data_offset(index)
            .ok_or(Error::ChunkIndexOutOfRange(index))?;
        let end = self.header.chunk_data_offset(index + 1).unwrap_or(self.length);
        Ok((start, end))
    }

    /// Read a chunk's raw (still-encoded) bytes.
    pub fn read_chunk_raw(&mut self, index: usize) -> Result<Vec<u8>> {
        let (start, end) = self.chunk_span(index)?;
        if end < start {
            return Err(Error::ChunkIndexOutOfRange(index));
        }
        let size = (end - start) as usize;

        self.reader.seek(SeekFrom::Start(self.offset + start))?;
        let mut buf = vec![0u8; size];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read and decode a single chunk.
    ///
    /// `verify` enables per-chunk MD5 checksum verification against the
    /// chunk table, where available.
    pub fn read_chunk(&mut self, index: usize, keys: &KeyService, verify: bool) -> Result<Vec<u8>> {
        let raw = self.read_chunk_raw(index)?;

        if verify {
            verify_chunk_checksum(index, &raw, &self.header)?;
        }

        let expected_size = self
            .header
            .get_chunk_info(index)
            .map_or(0, |info| info.decompressed_size as usize);
        let logical_offset = self.header.get_chunk_info(index).map_or(0, |info| info.decompressed_offset);

        decode_chunk(&raw, expected_size, index as u32, logical_offset, keys, verify)
    }

    /// Read and decode the entire stream, concatenating all chunks in order.
    pub fn read_all(&mut self, keys: &KeyService, verify: bool) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.total_decompressed_size() as usize);
        for index in 0..self.chunk_count() {
            out.extend(self.read_chunk(index, keys, verify)?);
        }
        Ok(out)
    }
}
