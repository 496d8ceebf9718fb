//! BLTE chunk encoding headers

use crate::{Error, Result};
use byteorder::ReadBytesExt;
use std::io::Read;

/// Header prefixing the ciphertext of an encrypted chunk (mode `E`).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EncryptedChunkHeader {
    key_name: Vec<u8>,
    iv: Vec<u8>,
}

impl EncryptedChunkHeader {
    /// Parses an encrypted chunk header.
    pub fn parse<R: Read>(f: &mut R) -> Result<Self> {
        let key_name_length = f.read_u8()?;
        let mut key_name = vec![0; key_name_length as usize];
        f.read_exact(&mut key_name)?;

        let iv_length = f.read_u8()?;
        let mut iv = vec![0; iv_length as usize];
        f.read_exact(&mut iv)?;

        Ok(Self { key_name, iv })
    }

    /// The key name bytes, little-endian, identifying a key in the key ring.
    pub fn key_name(&self) -> &[u8] {
        &self.key_name
    }

    /// The cipher IV bytes (4 bytes for Salsa20, 8 bytes for AES-CTR).
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Length of the [`EncryptedChunkHeader`] on disk, including length
    /// prefixes.
    pub fn len(&self) -> usize {
        self.key_name.len() + self.iv.len() + 2
    }

    /// `true` if the [`EncryptedChunkHeader`] would take up 0 bytes.
    ///
    /// This is always `false`.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// BLTE compression / encoding modes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEncodingHeader {
    /// No compression (mode 'N')
    None,
    /// ZLib compression (mode 'Z')
    ZLib,
    /// LZ4HC compression (mode '4')
    Lz4hc,
    /// Frame/Recursive BLTE (mode 'F')
    Frame,
    /// Encrypted (mode 'E')
    Encrypted(EncryptedChunkHeader),
}

impl ChunkEncodingHeader {
    /// Parses a chunk encoding header.
    pub fn parse<R: Read>(f: &mut R) -> Result<Self> {
        let mode = f.read_u8()?;

        Ok(match mode {
            b'N' => Self::None,
            b'Z' => Self::ZLib,
            b'4' => Self::Lz4hc,
            b'F' => Self::Frame,
            b'E' => Self::Encrypted(EncryptedChunkHeader::parse(f)?),
            other => return Err(Error::UnknownCompressionMode(other)),
        })
    }

    /// Length of the encoding header on disk.
    pub fn len(&self) -> usize {
        1 + if let Self::Encrypted(h) = self {
            h.len()
        } else {
            0
        }
    }

    /// `true` if the [`ChunkEncodingHeader`] would take up 0 bytes.
    ///
    /// This is always `false`.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }
}
