//! CASC manifest integration implementation

use crate::error::{CascError, Result};
use crate::types::EKey;
use casc_blte::BLTEFile;
use casc_crypto::KeyService;
use casc_format::encoding::EncodingFile;
use casc_format::root::wow6::{ContentFlags, LocaleFlags, WowRoot};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration for manifest loading
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    /// Locale to use for filtering files
    pub locale: LocaleFlags,
    /// Content flags to require (e.g., Windows, x86_64)
    pub content_flags: Option<ContentFlags>,
    /// Whether to cache manifests in memory
    pub cache_manifests: bool,
    /// Whether to load the audio-locale (voice-over) blocks instead of the
    /// non-audio blocks for the requested locale.
    pub audio_locale: bool,
    /// Mirrors CascLib's "override archive" option: when set, low-violence
    /// root blocks are not skipped.
    pub override_archive: bool,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            locale: LocaleFlags::any_locale(),
            content_flags: None,
            cache_manifests: true,
            audio_locale: false,
            override_archive: false,
        }
    }
}

/// Represents a file mapping from FileDataID to EKey
#[derive(Debug, Clone)]
pub struct FileMapping {
    /// FileDataID (game's internal file identifier)
    pub file_data_id: u32,
    /// Content key (MD5 hash from root manifest)
    pub content_key: [u8; 16],
    /// Encoding key (from encoding manifest)
    pub encoding_key: Option<EKey>,
    /// Content flags for this file
    pub flags: Option<ContentFlags>,
}

/// Manages CASC root/encoding manifests and their integration with storage
pub struct TactManifests {
    /// Configuration
    config: ManifestConfig,

    /// Decryption keys for BLTE-encrypted manifests
    keys: KeyService,

    /// Root manifest (FileDataID -> CKey)
    root: Arc<RwLock<Option<WowRoot>>>,

    /// Encoding manifest (CKey -> EKey)
    encoding: Arc<RwLock<Option<EncodingFile>>>,

    /// Cached FileDataID -> EKey mappings
    fdid_cache: Arc<RwLock<HashMap<u32, FileMapping>>>,

    /// Cached filename -> FileDataID mappings (from listfile)
    filename_cache: Arc<RwLock<HashMap<String, u32>>>,
}

impl TactManifests {
    /// Create a new manifest manager
    pub fn new(config: ManifestConfig) -> Self {
        Self {
            config,
            keys: KeyService::new(),
            root: Arc::new(RwLock::new(None)),
            encoding: Arc::new(RwLock::new(None)),
            fdid_cache: Arc::new(RwLock::new(HashMap::new())),
            filename_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Decompress `data` if it is a BLTE stream, otherwise return it unchanged.
    fn maybe_decompress(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        if data.starts_with(b"BLTE") {
            debug!("Manifest is BLTE compressed, decompressing");
            let length = data.len() as u64;
            let mut blte = BLTEFile::new(Cursor::new(data), 0, length)?;
            Ok(blte.read_all(&self.keys, true)?)
        } else {
            Ok(data)
        }
    }

    /// Load root manifest from raw data
    pub fn load_root_from_data(&self, data: Vec<u8>) -> Result<()> {
        info!("Loading root manifest from data ({} bytes)", data.len());

        let decompressed = self.maybe_decompress(data)?;

        let mut cursor = Cursor::new(decompressed);
        let root = WowRoot::parse(
            &mut cursor,
            self.config.locale,
            self.config.audio_locale,
            self.config.override_archive,
        )?;

        info!(
            "Loaded root manifest: {} FileDataIDs, {} name hashes",
            root.fid_md5.len(),
            root.name_hash_fid.len()
        );

        *self.root.write() = Some(root);
        self.fdid_cache.write().clear();

        Ok(())
    }

    /// Load encoding manifest from raw data
    pub fn load_encoding_from_data(&self, data: Vec<u8>) -> Result<()> {
        info!("Loading encoding manifest from data ({} bytes)", data.len());

        let decompressed = self.maybe_decompress(data)?;
        let encoding = EncodingFile::parse(&decompressed)?;

        info!(
            "Loaded encoding manifest: {} CKey entries",
            encoding.ckey_count()
        );

        *self.encoding.write() = Some(encoding);
        self.fdid_cache.write().clear();

        Ok(())
    }

    /// Load root manifest from file
    pub fn load_root_from_file(&self, path: &Path) -> Result<()> {
        info!("Loading root manifest from file: {:?}", path);
        let data = std::fs::read(path)?;
        self.load_root_from_data(data)
    }

    /// Load encoding manifest from file
    pub fn load_encoding_from_file(&self, path: &Path) -> Result<()> {
        info!("Loading encoding manifest from file: {:?}", path);
        let data = std::fs::read(path)?;
        self.load_encoding_from_data(data)
    }

    /// Load a listfile for filename -> FileDataID mappings
    pub fn load_listfile(&self, path: &Path) -> Result<usize> {
        info!("Loading listfile from: {:?}", path);

        let content = std::fs::read_to_string(path)?;
        let mut cache = self.filename_cache.write();
        cache.clear();

        let mut count = 0;
        for line in content.lines() {
            // Parse CSV format: "FileDataID;Filename"
            if let Some(sep_pos) = line.find(';') {
                if let Ok(fdid) = line[..sep_pos].parse::<u32>() {
                    let filename = line[sep_pos + 1..].to_string();
                    cache.insert(filename, fdid);
                    count += 1;
                }
            }
        }

        info!("Loaded {} filename mappings from listfile", count);
        Ok(count)
    }

    /// Lookup a file by FileDataID
    pub fn lookup_by_fdid(&self, fdid: u32) -> Result<FileMapping> {
        {
            let cache = self.fdid_cache.read();
            if let Some(mapping) = cache.get(&fdid) {
                return Ok(mapping.clone());
            }
        }

        let root = self.root.read();
        let encoding = self.encoding.read();

        let root = root
            .as_ref()
            .ok_or_else(|| CascError::ManifestNotLoaded("root".to_string()))?;
        let encoding = encoding
            .as_ref()
            .ok_or_else(|| CascError::ManifestNotLoaded("encoding".to_string()))?;

        let content_entries = root
            .fid_md5
            .get(&fdid)
            .ok_or_else(|| CascError::EntryNotFound(format!("FileDataID {fdid}")))?;

        let (flags, content_key) = self.select_best_content(content_entries)?;

        let encoding_entry = encoding.lookup_by_ckey(content_key).ok_or_else(|| {
            CascError::EntryNotFound(format!("CKey {} in encoding", hex::encode(content_key)))
        })?;

        let ekey = encoding_entry
            .encoding_keys
            .first()
            .ok_or_else(|| CascError::EntryNotFound("EKey in encoding entry".to_string()))?;

        let mapping = FileMapping {
            file_data_id: fdid,
            content_key: *content_key,
            encoding_key: EKey::from_slice(ekey),
            flags: Some(*flags),
        };

        if self.config.cache_manifests {
            self.fdid_cache.write().insert(fdid, mapping.clone());
        }

        Ok(mapping)
    }

    /// Lookup a file by filename
    pub fn lookup_by_filename(&self, filename: &str) -> Result<FileMapping> {
        let fdid = {
            let cache = self.filename_cache.read();
            cache.get(filename).copied()
        };

        if let Some(fdid) = fdid {
            return self.lookup_by_fdid(fdid);
        }

        let root = self.root.read();
        let root = root
            .as_ref()
            .ok_or_else(|| CascError::ManifestNotLoaded("root".to_string()))?;

        let fdid = root
            .get_fid(filename)
            .ok_or_else(|| CascError::EntryNotFound(format!("Filename: {filename}")))?;

        drop(root);
        self.lookup_by_fdid(fdid)
    }

    /// All filenames known from a loaded listfile.
    pub fn filenames(&self) -> Vec<String> {
        self.filename_cache.read().keys().cloned().collect()
    }

    /// Get all FileDataIDs
    pub fn get_all_fdids(&self) -> Result<Vec<u32>> {
        let root = self.root.read();
        let root = root
            .as_ref()
            .ok_or_else(|| CascError::ManifestNotLoaded("root".to_string()))?;

        Ok(root.fid_md5.keys().copied().collect())
    }

    /// Get FileDataID for a filename (if known)
    pub fn get_fdid_for_filename(&self, filename: &str) -> Option<u32> {
        {
            let cache = self.filename_cache.read();
            if let Some(&fdid) = cache.get(filename) {
                return Some(fdid);
            }
        }

        let root = self.root.read();
        root.as_ref()?.get_fid(filename)
    }

    /// Get EKey for a FileDataID (if manifests are loaded)
    pub fn get_ekey_for_fdid(&self, fdid: u32) -> Result<EKey> {
        let mapping = self.lookup_by_fdid(fdid)?;
        mapping
            .encoding_key
            .ok_or_else(|| CascError::EntryNotFound(format!("EKey for FDID {fdid}")))
    }

    /// Check if manifests are loaded
    pub fn is_loaded(&self) -> bool {
        self.root.read().is_some() && self.encoding.read().is_some()
    }

    /// Clear all cached data
    pub fn clear_cache(&self) {
        self.fdid_cache.write().clear();
        debug!("Cleared FileDataID cache");
    }

    /// Select the best content entry based on locale and content flags
    fn select_best_content<'a>(
        &self,
        entries: &'a std::collections::BTreeMap<
            casc_format::root::wow6::LocaleContentFlags,
            [u8; 16],
        >,
    ) -> Result<(&'a ContentFlags, &'a [u8; 16])> {
        if entries.len() == 1 {
            let (flags, key) = entries.iter().next().unwrap();
            return Ok((&flags.content, key));
        }

        let locale_matches: Vec<_> = entries
            .iter()
            .filter(|(flags, _)| (flags.locale & self.config.locale).any() || flags.locale.all())
            .collect();

        if locale_matches.is_empty() {
            let (flags, key) = entries.iter().next().unwrap();
            return Ok((&flags.content, key));
        }

        if let Some(required_flags) = self.config.content_flags {
            for (flags, key) in &locale_matches {
                if self.content_flags_match(&flags.content, &required_flags) {
                    return Ok((&flags.content, key));
                }
            }
        }

        let (flags, key) = locale_matches[0];
        Ok((&flags.content, key))
    }

    /// Check if content flags match requirements
    fn content_flags_match(&self, flags: &ContentFlags, required: &ContentFlags) -> bool {
        if required.windows() && !flags.windows() {
            return false;
        }
        if required.macos() && !flags.macos() {
            return false;
        }

        if required.x86_64() && !flags.x86_64() {
            return false;
        }
        if required.x86_32() && !flags.x86_32() {
            return false;
        }
        if required.aarch64() && !flags.aarch64() {
            return false;
        }

        true
    }
}
