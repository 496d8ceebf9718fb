//! Synchronous, thread-neutral CASC storage façade.
//!
//! `Storage` owns the [`KeyIndex`], the archive set, and the whole-file
//! decode cache behind `parking_lot` locks so it stays `Send + Sync` and
//! freely shareable once open. Each [`FileHandle`] carries its own
//! [`SpanReader`] and is intentionally not `Sync`, matching the span
//! reader's single-threaded frame cache.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::archive::{Archive, CacheStrategy, FileSpan, SpanReader};
use crate::cache::LockFreeCache;
use crate::cancel::CancellationToken;
use crate::config::{ConfigDiscovery, WowConfigSet};
use crate::error::{CascError, Result};
use crate::index::{CKeyEntry, GroupIndex, IdxParser, KeyIndex};
use crate::manifest::{ManifestConfig, TactManifests};
use crate::types::{ArchiveLocation, CascConfig, StorageOpenParams};

use casc_crypto::KeyService;
use casc_format::encoding::EncodingFile;

/// How a caller identifies the logical file being opened.
#[derive(Debug, Clone)]
pub enum OpenTarget<'a> {
    Name(&'a str),
    FileId(u32),
    CKey([u8; 16]),
    EKey([u8; 16]),
}

/// Read behavior flags for [`Storage::open_file`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    /// Verify every frame's MD5 on read.
    pub strict_data_check: bool,
    /// Zero-fill frames whose decryption key is missing instead of failing.
    pub overcome_encrypted: bool,
}

/// Snapshot of storage-wide metadata, per [`Storage::get_storage_info`].
#[derive(Debug, Clone, Default)]
pub struct StorageInfo {
    pub file_count: usize,
    pub archive_count: usize,
    pub build_name: Option<String>,
}

struct StorageInner {
    key_index: RwLock<KeyIndex>,
    archives: Arc<Mutex<HashMap<u16, Archive>>>,
    cache: LockFreeCache,
    keys: RwLock<KeyService>,
    tact: RwLock<Option<TactManifests>>,
    config_set: Option<WowConfigSet>,
    #[allow(dead_code)]
    data_path: PathBuf,
}

/// A mounted, read-only CASC storage. Cheap to clone: every clone shares
/// the same underlying index, archive set, and cache.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<StorageInner>,
}

impl Storage {
    /// Mount a CASC installation rooted at `path` (the directory containing
    /// `Data/`).
    pub fn open_storage<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_storage_ex(StorageOpenParams {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        })
    }

    /// Mount a CASC installation with explicit locale/product/CDN hints.
    /// The CDN/online/product fields are accepted but unused: this library
    /// only ever reads from the local on-disk mount.
    pub fn open_storage_ex(params: StorageOpenParams) -> Result<Self> {
        let config = CascConfig {
            data_path: params.path,
            ..Default::default()
        };

        let data_dir = Self::resolve_data_dir(&config.data_path)?;
        info!("Mounting CASC storage at {:?}", data_dir);

        let cancel = params.cancel_token.as_ref();
        let mut key_index = KeyIndex::new();
        let archives = Self::load_archives(&data_dir, cancel)?;
        Self::load_indices(&data_dir, &mut key_index, cancel)?;

        let config_set = ConfigDiscovery::discover_configs(&config.data_path).ok();

        Ok(Self {
            inner: Arc::new(StorageInner {
                key_index: RwLock::new(key_index),
                archives: Arc::new(Mutex::new(archives)),
                cache: LockFreeCache::new(config.cache_size_mb as usize * 1024 * 1024),
                keys: RwLock::new(KeyService::new()),
                tact: RwLock::new(None),
                config_set,
                data_path: data_dir,
            }),
        })
    }

    fn resolve_data_dir(base: &Path) -> Result<PathBuf> {
        let direct = base.join("data");
        if direct.is_dir() {
            return Ok(direct);
        }
        let nested = base.join("Data").join("data");
        if nested.is_dir() {
            return Ok(nested);
        }
        if base.is_dir() {
            return Ok(base.to_path_buf());
        }
        Err(CascError::InvalidParameter(format!(
            "no CASC data directory found under {base:?}"
        )))
    }

    fn load_archives(data_dir: &Path, cancel: Option<&CancellationToken>) -> Result<HashMap<u16, Archive>> {
        let mut archives = HashMap::new();
        for entry in fs::read_dir(data_dir)? {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(CascError::Cancelled);
            }
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(suffix) = name.strip_prefix("data.") {
                if let Ok(id) = suffix.parse::<u16>() {
                    archives.insert(id, Archive::new(id, path)?);
                }
            }
        }
        debug!("Loaded {} archives", archives.len());
        Ok(archives)
    }

    /// Parse every `.idx` bucket index (keeping only the newest version per
    /// bucket) and every `.index` group index, registering their entries as
    /// bare EKey locations in `key_index`.
    fn load_indices(data_dir: &Path, key_index: &mut KeyIndex, cancel: Option<&CancellationToken>) -> Result<()> {
        let mut latest: HashMap<u8, (u16, Vec<([u8; 16], ArchiveLocation)>)> = HashMap::new();

        for entry in fs::read_dir(data_dir)? {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(CascError::Cancelled);
            }
            let entry = entry?;
            let path = entry.path();
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };

            match ext {
                "idx" => {
                    let parser = match IdxParser::parse_file(&path) {
                        Ok(p) => p,
                        Err(e) => {
                            warn!("Skipping unreadable idx file {:?}: {}", path, e);
                            continue;
                        }
                    };
                    let bucket = parser.bucket();
                    let version = parser.version();
                    let newer = latest.get(&bucket).is_none_or(|(v, _)| version > *v);
                    if newer {
                        let entries = parser
                            .entries()
                            .map(|(ekey, loc)| (*ekey.as_bytes(), *loc))
                            .collect();
                        latest.insert(bucket, (version, entries));
                    }
                }
                "index" => {
                    let group = match GroupIndex::parse_file(&path) {
                        Ok(g) => g,
                        Err(e) => {
                            warn!("Skipping unreadable group index {:?}: {}", path, e);
                            continue;
                        }
                    };
                    for (ekey, loc) in group.entries() {
                        key_index.insert_location(*ekey.as_bytes(), *loc);
                    }
                }
                _ => {}
            }
        }

        let total: usize = latest.values().map(|(_, e)| e.len()).sum();
        debug!("Loaded {} bucket idx files, {} entries", latest.len(), total);

        for (_, entries) in latest.into_values() {
            for (ekey, loc) in entries {
                key_index.insert_location(ekey, loc);
            }
        }

        Ok(())
    }

    /// Parse an encoding table and enrich the key index with its CKey to
    /// EKey mappings. Entries arriving before or after `.idx` loading fill
    /// in each other's gaps (see [`KeyIndex::insert_encoding`]).
    pub fn load_encoding(&self, data: &[u8]) -> Result<()> {
        let encoding = EncodingFile::parse(data)?;
        info!(
            "Loaded encoding table: {} CKey entries",
            encoding.ckey_count()
        );

        let mut key_index = self.inner.key_index.write();
        for entry in encoding.entries() {
            let Ok(ckey) = <[u8; 16]>::try_from(entry.content_key.as_slice()) else {
                continue;
            };
            let ekeys: Vec<[u8; 16]> = entry
                .encoding_keys
                .iter()
                .filter_map(|e| <[u8; 16]>::try_from(e.as_slice()).ok())
                .collect();
            if ekeys.is_empty() {
                continue;
            }
            key_index.insert_encoding(ckey, ekeys, Some(entry.size), None);
        }
        Ok(())
    }

    /// Enable FileDataID/filename resolution by loading root and encoding
    /// manifests, mirroring what an online client fetches from the build
    /// config before mounting.
    pub fn init_manifests(&self, manifest_config: ManifestConfig) {
        *self.inner.tact.write() = Some(TactManifests::new(manifest_config));
    }

    pub fn load_root_manifest(&self, data: Vec<u8>) -> Result<()> {
        self.with_tact(|t| t.load_root_from_data(data))
    }

    pub fn load_root_manifest_from_file(&self, path: &Path) -> Result<()> {
        self.with_tact(|t| t.load_root_from_file(path))
    }

    pub fn load_encoding_manifest(&self, data: Vec<u8>) -> Result<()> {
        self.with_tact(|t| t.load_encoding_from_data(data))
    }

    pub fn load_listfile(&self, path: &Path) -> Result<usize> {
        self.with_tact(|t| t.load_listfile(path))
    }

    fn with_tact<T>(&self, f: impl FnOnce(&TactManifests) -> Result<T>) -> Result<T> {
        let guard = self.inner.tact.read();
        let tact = guard
            .as_ref()
            .ok_or_else(|| CascError::ManifestNotLoaded("root/encoding".into()))?;
        f(tact)
    }

    /// Register a decryption key for `BLTE` `E`-mode frames.
    pub fn storage_set_key(&self, key_id: u64, key: [u8; 16]) {
        self.inner.keys.write().add_key(key_id, key);
    }

    /// Import a key-ring file (csv/tsv/txt format).
    pub fn storage_import_keys(&self, path: &Path) -> Result<usize> {
        Ok(self.inner.keys.write().load_key_file(path)?)
    }

    pub fn get_storage_info(&self) -> StorageInfo {
        StorageInfo {
            file_count: self.inner.key_index.read().len(),
            archive_count: self.inner.archives.lock().len(),
            build_name: self
                .inner
                .config_set
                .as_ref()
                .and_then(WowConfigSet::latest_build_config)
                .and_then(|b| b.build_name.clone()),
        }
    }

    fn resolve(&self, target: &OpenTarget<'_>) -> Result<CKeyEntry> {
        match target {
            OpenTarget::CKey(ckey) => self
                .inner
                .key_index
                .read()
                .by_ckey(ckey)
                .cloned()
                .ok_or_else(|| CascError::FileNotFound(hex::encode(ckey))),
            OpenTarget::EKey(ekey) => self
                .inner
                .key_index
                .read()
                .by_ekey(ekey)
                .cloned()
                .ok_or_else(|| CascError::FileNotFound(hex::encode(ekey))),
            OpenTarget::Name(name) => {
                if let Ok(mapping) = self.with_tact(|t| t.lookup_by_filename(name)) {
                    if let Some(entry) = self.inner.key_index.read().by_ckey(&mapping.content_key).cloned() {
                        return Ok(entry);
                    }
                }
                self.resolve_by_string(name)
                    .ok_or_else(|| CascError::FileNotFound((*name).to_string()))
            }
            OpenTarget::FileId(fdid) => {
                let mapping = self.with_tact(|t| t.lookup_by_fdid(*fdid))?;
                self.inner
                    .key_index
                    .read()
                    .by_ckey(&mapping.content_key)
                    .cloned()
                    .ok_or_else(|| CascError::FileNotFound(format!("FileDataID {fdid}")))
            }
        }
    }

    /// CascLib's by-name fallback chain: a name that doesn't resolve through
    /// the root handler is retried as a `FILE########[.ext]` FileDataId,
    /// then as a hex CKey, then as a hex EKey.
    fn resolve_by_string(&self, name: &str) -> Option<CKeyEntry> {
        if let Some(fdid) = parse_file_data_id_name(name) {
            if let Ok(mapping) = self.with_tact(|t| t.lookup_by_fdid(fdid)) {
                if let Some(entry) = self.inner.key_index.read().by_ckey(&mapping.content_key).cloned() {
                    return Some(entry);
                }
            }
        }

        if name.len() == 32 {
            if let Ok(bytes) = hex::decode(name) {
                if let Ok(key) = <[u8; 16]>::try_from(bytes.as_slice()) {
                    let index = self.inner.key_index.read();
                    if let Some(entry) = index.by_ckey(&key).cloned() {
                        return Some(entry);
                    }
                    if let Some(entry) = index.by_ekey(&key).cloned() {
                        return Some(entry);
                    }
                }
            }
        }

        None
    }

    /// Open a logical file for reading. For files whose content spans
    /// several archive fragments, each span's decompressed length is read
    /// from its BLTE header up front so the reader can address the whole
    /// file as one contiguous logical stream.
    pub fn open_file(&self, target: OpenTarget<'_>, flags: OpenFlags) -> Result<FileHandle> {
        let entry = self.resolve(&target)?;
        if entry.ekeys.is_empty() {
            return Err(CascError::FileCorrupt("entry has no encoding keys".into()));
        }

        let spans = self.build_spans(&entry)?;

        let keys = Arc::new(self.inner.keys.read().clone());
        let reader = SpanReader::new(
            spans,
            Arc::clone(&self.inner.archives),
            keys,
            CacheStrategy::LastFrame,
            flags.strict_data_check,
            flags.overcome_encrypted,
        );

        Ok(FileHandle {
            reader,
            content_size: entry.content_size,
            encoded_size: entry.encoded_size,
        })
    }

    /// Build the ordered [`FileSpan`] list for a resolved entry. A
    /// single-span file (the common case) skips the header peek and uses
    /// the entry's reported content size directly; a multi-span file has
    /// each fragment's BLTE header read to learn its decompressed length,
    /// since the encoding table only records the file's total size.
    fn build_spans(&self, entry: &CKeyEntry) -> Result<Vec<FileSpan>> {
        if entry.ekeys.len() == 1 {
            let location = entry.spans[0].ok_or_else(|| {
                CascError::FileCorrupt("entry has no storage location".into())
            })?;
            return Ok(vec![FileSpan {
                location,
                logical_start: 0,
                logical_end: entry.content_size.unwrap_or(u64::from(location.size)),
            }]);
        }

        let archives = Arc::clone(&self.inner.archives);
        let mut spans = Vec::with_capacity(entry.ekeys.len());
        let mut cursor = 0u64;

        for (i, location) in entry.spans.iter().enumerate() {
            let location = location.ok_or_else(|| {
                CascError::FileCorrupt(format!("span {i} has no storage location"))
            })?;
            let span_len = Self::span_decompressed_len(&archives, &location)?;
            spans.push(FileSpan {
                location,
                logical_start: cursor,
                logical_end: cursor + span_len,
            });
            cursor += span_len;
        }

        Ok(spans)
    }

    /// Read a span's raw archive entry far enough to parse its BLTE
    /// header and learn the decompressed size it will produce.
    fn span_decompressed_len(
        archives: &Arc<Mutex<HashMap<u16, Archive>>>,
        location: &ArchiveLocation,
    ) -> Result<u64> {
        use std::io::Cursor;

        const ENTRY_HEADER_SIZE: usize = 30;

        let raw = {
            let mut archives = archives.lock();
            let archive = archives
                .get_mut(&location.archive_id)
                .ok_or(CascError::ArchiveNotFound(location.archive_id))?;
            archive.read_at(location)?
        };

        if raw.len() < ENTRY_HEADER_SIZE {
            return Err(CascError::InvalidArchiveFormat(format!(
                "archive entry too small: {} bytes",
                raw.len()
            )));
        }

        let body = raw[ENTRY_HEADER_SIZE..].to_vec();
        let length = body.len() as u64;
        let blte = casc_blte::BLTEFile::new(Cursor::new(body), 0, length)?;
        Ok(blte.total_decompressed_size())
    }

    pub fn read_file(&self, handle: &mut FileHandle, buf: &mut [u8]) -> Result<usize> {
        handle.reader.read(buf)
    }

    pub fn read_file_at(
        &self,
        handle: &mut FileHandle,
        offset: u64,
        buf: &mut [u8],
    ) -> Result<usize> {
        handle.reader.read_at(offset, buf)
    }

    pub fn get_file_size(&self, handle: &FileHandle) -> (Option<u64>, Option<u64>) {
        (handle.content_size, handle.encoded_size)
    }

    /// Iterate filenames known from a loaded listfile matching a simple
    /// `*`/`?` glob mask.
    pub fn find(&self, mask: &str) -> FindIter<'_> {
        self.find_cancellable(mask, None)
    }

    /// Same as [`Storage::find`], but checked against `cancel` between
    /// entries; a cancelled token ends the walk with `Cancelled`.
    pub fn find_cancellable(&self, mask: &str, cancel: Option<CancellationToken>) -> FindIter<'_> {
        let names = self
            .inner
            .tact
            .read()
            .as_ref()
            .map(TactManifests::filenames)
            .unwrap_or_default()
            .into_iter()
            .filter(|name| glob_match(mask, name))
            .collect::<Vec<_>>();
        FindIter {
            storage: self,
            names: names.into_iter(),
            cancel,
            cancelled: false,
        }
    }
}

/// An open logical file: a span reader plus the sizes reported by the
/// encoding table.
pub struct FileHandle {
    reader: SpanReader,
    content_size: Option<u64>,
    encoded_size: Option<u64>,
}

impl FileHandle {
    pub fn len(&self) -> u64 {
        self.reader.total_len()
    }

    pub fn is_empty(&self) -> bool {
        self.reader.total_len() == 0
    }

    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    pub fn seek(&mut self, offset: u64) {
        self.reader.seek(offset);
    }
}

/// Iterator over filenames matching a glob mask, replacing the
/// find-first/find-next pair with a standard Rust iterator.
pub struct FindIter<'a> {
    storage: &'a Storage,
    names: std::vec::IntoIter<String>,
    cancel: Option<CancellationToken>,
    cancelled: bool,
}

/// One matched entry from [`Storage::find`].
#[derive(Debug, Clone)]
pub struct FindEntry {
    pub name: String,
    pub ckey: [u8; 16],
    pub content_size: Option<u64>,
}

impl Iterator for FindIter<'_> {
    type Item = Result<FindEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cancelled {
                return None;
            }
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                self.cancelled = true;
                return Some(Err(CascError::Cancelled));
            }

            let name = self.names.next()?;
            let Ok(mapping) = self.storage.with_tact(|t| t.lookup_by_filename(&name)) else {
                continue;
            };
            let content_size = self
                .storage
                .inner
                .key_index
                .read()
                .by_ckey(&mapping.content_key)
                .and_then(|e| e.content_size);
            return Some(Ok(FindEntry {
                name,
                ckey: mapping.content_key,
                content_size,
            }));
        }
    }
}

/// Parses `FILE########[.ext]` (case-insensitive, 8 hex digits) into a
/// FileDataId, matching CascLib's `IsFileDataIdName`.
fn parse_file_data_id_name(name: &str) -> Option<u32> {
    let bytes = name.as_bytes();
    if bytes.len() < 12 {
        return None;
    }
    if !bytes[0..4].eq_ignore_ascii_case(b"FILE") {
        return None;
    }
    let digits = std::str::from_utf8(&bytes[4..12]).ok()?;
    let fdid = u32::from_str_radix(digits, 16).ok()?;
    match bytes.get(12) {
        None => Some(fdid),
        Some(b'.') => Some(fdid),
        _ => None,
    }
}

fn glob_match(mask: &str, name: &str) -> bool {
    fn matches(mask: &[u8], name: &[u8]) -> bool {
        match (mask.first(), name.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                matches(&mask[1..], name) || (!name.is_empty() && matches(mask, &name[1..]))
            }
            (Some(b'?'), Some(_)) => matches(&mask[1..], &name[1..]),
            (Some(m), Some(n)) if m.to_ascii_lowercase() == n.to_ascii_lowercase() => {
                matches(&mask[1..], &name[1..])
            }
            _ => false,
        }
    }
    matches(mask.as_bytes(), name.as_bytes())
}
