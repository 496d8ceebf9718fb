//! CASC (Content Addressable Storage Container) read-only mounting.
//!
//! Provides a synchronous, thread-neutral library for mounting a CASC
//! storage and retrieving logical files by name, FileDataID, content key,
//! or encoding key, built on the two-level CKey/EKey hash index, the
//! per-product root handlers in `casc-format`, and the BLTE frame engine
//! in `casc-blte`.

pub mod archive;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod error;
pub mod index;
pub mod manifest;
pub mod storage;
pub mod types;

pub use cancel::CancellationToken;
pub use error::{CascError, Result};
pub use storage::{FileHandle, FindEntry, FindIter, OpenFlags, OpenTarget, Storage, StorageInfo};
pub use types::{ArchiveLocation, CascConfig, EKey, IndexEntry, StorageOpenParams};

// Re-export commonly used types
pub use archive::{Archive, ArchiveReader, CacheStrategy, FileSpan, SpanReader};
pub use cache::LockFreeCache;
pub use config::{ConfigDiscovery, WowConfigSet};
pub use index::{CKeyEntry, GroupIndex, IdxParser, KeyIndex};
pub use manifest::{FileMapping, ManifestConfig, TactManifests};
