//! BLTE (Block Table Encoded) decoding for CASC-stored content.
//!
//! BLTE wraps content stored in CASC archives with per-chunk integrity
//! checksums and one of several encodings: stored (`N`), zlib-deflate (`Z`),
//! LZ4HC (`4`), a nested BLTE stream (`F`), or an encrypted payload (`E`,
//! Salsa20 or AES-128-CTR) that itself redispatches on its decrypted mode
//! byte. This crate provides parsing and decoding for all of these.

mod chunk;
mod error;
mod frame;
mod header;
mod read;

pub use chunk::{ChunkEncodingHeader, EncryptedChunkHeader};
pub use error::{Error, Result};
pub use header::{BLTEHeader, ChunkInfo};
pub use read::BLTEFile;

/// BLTE magic bytes
pub const BLTE_MAGIC: [u8; 4] = *b"BLTE";

const MD5_LENGTH: usize = 16;
pub type Md5 = [u8; MD5_LENGTH];
