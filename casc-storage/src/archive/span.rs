//! Per-file span reader: stitches the one or more physical archive
//! fragments backing a logical file into a single random-access byte
//! stream, with a per-handle frame cache.
//!
//! A `CKeyEntry` with `span_count > 1` has its content split across
//! several archives; each [`FileSpan`] covers one contiguous logical
//! range. Within a span the underlying bytes are a BLTE stream, whose
//! frames are decoded lazily and cached according to the handle's
//! [`CacheStrategy`].

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use casc_blte::BLTEFile;
use casc_crypto::KeyService;
use parking_lot::Mutex;

use crate::archive::Archive;
use crate::error::{CascError, Result};
use crate::types::ArchiveLocation;

/// CASC archives store a 30-byte header before each entry's BLTE body:
/// `{EKey[16], size[4 LE], flags[2], checksum[8]}`.
const CASC_ENTRY_HEADER_SIZE: usize = 30;

/// One physical fragment of a logical file.
#[derive(Debug, Clone, Copy)]
pub struct FileSpan {
    pub location: ArchiveLocation,
    /// Logical byte range `[start, end)` this span covers within the
    /// whole file.
    pub logical_start: u64,
    pub logical_end: u64,
}

impl FileSpan {
    pub fn len(&self) -> u64 {
        self.logical_end - self.logical_start
    }

    pub fn is_empty(&self) -> bool {
        self.logical_start == self.logical_end
    }
}

/// Cache strategy for a [`SpanReader`]'s frame buffer, per the span file
/// reader's cache strategies: decode one frame at a time for sequential
/// streaming, or keep growing a buffer to serve arbitrary random access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    #[default]
    LastFrame,
    InternalBuffer,
}

struct CachedRange {
    span_index: usize,
    logical_start: u64,
    logical_end: u64,
    data: Vec<u8>,
}

/// Per-`FileHandle` reader over a file's spans.
///
/// Not `Sync`: the decoded-frame cache and file pointer are mutable and
/// single-threaded by design, distinct from the storage-wide
/// `cache::LockFreeCache`.
pub struct SpanReader {
    spans: Vec<FileSpan>,
    total_len: u64,
    archives: Arc<Mutex<HashMap<u16, Archive>>>,
    keys: Arc<KeyService>,
    strategy: CacheStrategy,
    strict_integrity: bool,
    tolerate_missing_keys: bool,
    open_span: Option<(usize, BLTEFile<Cursor<Vec<u8>>>)>,
    cache: Option<CachedRange>,
    position: u64,
}

impl SpanReader {
    pub fn new(
        spans: Vec<FileSpan>,
        archives: Arc<Mutex<HashMap<u16, Archive>>>,
        keys: Arc<KeyService>,
        strategy: CacheStrategy,
        strict_integrity: bool,
        tolerate_missing_keys: bool,
    ) -> Self {
        let total_len = spans.last().map_or(0, |s| s.logical_end);
        Self {
            spans,
            total_len,
            archives,
            keys,
            strategy,
            strict_integrity,
            tolerate_missing_keys,
            open_span: None,
            cache: None,
            position: 0,
        }
    }

    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn seek(&mut self, offset: u64) {
        self.position = offset;
    }

    /// Read up to `buf.len()` bytes starting at the handle's current
    /// position, advancing it by the number of bytes produced.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.read_at(self.position, buf)?;
        self.position += n as u64;
        Ok(n)
    }

    /// Read up to `buf.len()` bytes starting at logical `offset`. Never
    /// returns a short read except at end of file.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if offset > self.total_len {
            return Err(CascError::HandleEof);
        }
        if offset == self.total_len {
            return Ok(0);
        }

        let mut written = 0usize;
        let mut cursor = offset;

        while written < buf.len() && cursor < self.total_len {
            let span_index = self.find_span(cursor)?;
            let span = self.spans[span_index];

            if !self.cache_covers(span_index, cursor) {
                self.fill_cache(span_index, cursor)?;
            }

            let cached = self.cache.as_ref().ok_or_else(|| {
                CascError::InvalidArchiveFormat("frame cache empty after fill".into())
            })?;

            let cache_off = (cursor - cached.logical_start) as usize;
            let available = cached.data.len() - cache_off;
            let want = (buf.len() - written).min(available);
            buf[written..written + want].copy_from_slice(&cached.data[cache_off..cache_off + want]);

            written += want;
            cursor += want as u64;

            // Cache ran out before the span's logical end: that only
            // happens at the span boundary, so move on to the next span.
            if cursor >= span.logical_end {
                continue;
            }
        }

        Ok(written)
    }

    fn find_span(&self, offset: u64) -> Result<usize> {
        self.spans
            .iter()
            .position(|s| offset >= s.logical_start && offset < s.logical_end)
            .ok_or_else(|| CascError::InvalidArchiveFormat(format!("no span covers offset {offset}")))
    }

    fn cache_covers(&self, span_index: usize, offset: u64) -> bool {
        self.cache.as_ref().is_some_and(|c| {
            c.span_index == span_index && offset >= c.logical_start && offset < c.logical_end
        })
    }

    fn open_span(&mut self, span_index: usize) -> Result<()> {
        if self.open_span.as_ref().is_some_and(|(i, _)| *i == span_index) {
            return Ok(());
        }

        let span = self.spans[span_index];
        let raw = {
            let mut archives = self.archives.lock();
            let archive = archives
                .get_mut(&span.location.archive_id)
                .ok_or(CascError::ArchiveNotFound(span.location.archive_id))?;
            archive.read_at(&span.location)?
        };

        if raw.len() < CASC_ENTRY_HEADER_SIZE {
            return Err(CascError::InvalidArchiveFormat(format!(
                "archive entry too small: {} bytes",
                raw.len()
            )));
        }

        let body = raw[CASC_ENTRY_HEADER_SIZE..].to_vec();
        let length = body.len() as u64;
        let blte = BLTEFile::new(Cursor::new(body), 0, length)?;

        self.open_span = Some((span_index, blte));
        Ok(())
    }

    fn fill_cache(&mut self, span_index: usize, offset: u64) -> Result<()> {
        self.open_span(span_index)?;
        let span = self.spans[span_index];
        let span_relative = offset - span.logical_start;

        let (_, blte) = self
            .open_span
            .as_mut()
            .expect("open_span just populated it");

        match self.strategy {
            CacheStrategy::InternalBuffer => {
                let data = self.decode_all(blte)?;
                self.cache = Some(CachedRange {
                    span_index,
                    logical_start: span.logical_start,
                    logical_end: span.logical_end,
                    data,
                });
            }
            CacheStrategy::LastFrame => {
                let chunk_index = Self::chunk_for_offset(blte, span_relative);
                let chunk_start = blte
                    .header()
                    .get_chunk_info(chunk_index)
                    .map_or(0, |info| info.decompressed_offset);
                let data = self.decode_chunk(blte, chunk_index)?;
                let chunk_len = data.len() as u64;
                self.cache = Some(CachedRange {
                    span_index,
                    logical_start: span.logical_start + chunk_start,
                    logical_end: span.logical_start + chunk_start + chunk_len,
                    data,
                });
            }
        }

        Ok(())
    }

    fn chunk_for_offset(blte: &BLTEFile<Cursor<Vec<u8>>>, span_relative: u64) -> usize {
        let count = blte.chunk_count();
        if count <= 1 {
            return 0;
        }
        for index in 0..count {
            let start = blte
                .header()
                .get_chunk_info(index)
                .map_or(0, |info| info.decompressed_offset);
            let end = blte
                .header()
                .get_chunk_info(index + 1)
                .map_or(u64::MAX, |info| info.decompressed_offset);
            if span_relative >= start && span_relative < end {
                return index;
            }
        }
        count - 1
    }

    fn decode_chunk(&self, blte: &mut BLTEFile<Cursor<Vec<u8>>>, index: usize) -> Result<Vec<u8>> {
        match blte.read_chunk(index, &self.keys, self.strict_integrity) {
            Ok(data) => Ok(data),
            Err(casc_blte::Error::KeyNotFound(_)) if self.tolerate_missing_keys => {
                tracing::warn!("decryption key missing, zero-filling chunk {index}");
                let size = blte
                    .header()
                    .get_chunk_info(index)
                    .map_or(0, |info| info.decompressed_size as usize);
                Ok(vec![0u8; size])
            }
            Err(e) => Err(e.into()),
        }
    }

    fn decode_all(&self, blte: &mut BLTEFile<Cursor<Vec<u8>>>) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(blte.total_decompressed_size() as usize);
        for index in 0..blte.chunk_count() {
            out.extend(self.decode_chunk(blte, index)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Archive;
    use std::io::Write;

    fn single_frame_blte(payload: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"BLTE");
        data.extend_from_slice(&0u32.to_be_bytes());
        data.push(b'N');
        data.extend_from_slice(payload);
        data
    }

    fn archive_entry(ekey: [u8; 16], blte: &[u8]) -> Vec<u8> {
        let mut entry = Vec::new();
        entry.extend_from_slice(&ekey);
        entry.extend_from_slice(&(blte.len() as u32).to_le_bytes());
        entry.extend_from_slice(&[0u8; 2]);
        entry.extend_from_slice(&[0u8; 8]);
        entry.extend_from_slice(blte);
        entry
    }

    #[test]
    fn reads_single_span_single_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.000");

        let blte = single_frame_blte(b"hello span");
        let entry = archive_entry([0x11; 16], &blte);
        std::fs::File::create(&path).unwrap().write_all(&entry).unwrap();

        let archive = Archive::new(0, path).unwrap();
        let mut archives = HashMap::new();
        archives.insert(0u16, archive);

        let span = FileSpan {
            location: ArchiveLocation {
                archive_id: 0,
                offset: 0,
                size: entry.len() as u32,
            },
            logical_start: 0,
            logical_end: 10,
        };

        let mut reader = SpanReader::new(
            vec![span],
            Arc::new(Mutex::new(archives)),
            Arc::new(KeyService::empty()),
            CacheStrategy::LastFrame,
            false,
            false,
        );

        let mut buf = [0u8; 10];
        let n = reader.read_at(0, &mut buf).unwrap();
        assert_eq!(n, 10);
        assert_eq!(&buf, b"hello span");
    }
}
