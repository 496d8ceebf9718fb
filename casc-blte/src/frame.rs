//! Per-chunk payload decoding: mode dispatch, decompression, and decryption.
//!
//! A chunk's raw bytes are `[ChunkEncodingHeader][payload]`. Decoding a chunk
//! means stripping the encoding header and interpreting the payload
//! according to its mode, recursing for `E` (decrypt, then redispatch on the
//! decrypted mode byte) and `F` (a nested, self-contained BLTE stream).

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use casc_crypto::KeyService;
use flate2::read::ZlibDecoder;
use tracing::warn;

use crate::chunk::{ChunkEncodingHeader, EncryptedChunkHeader};
use crate::header::BLTEHeader;
use crate::{Error, Result};

/// Verify a chunk's compressed-form MD5 against its header entry.
///
/// Single-chunk streams carry no chunk table entry, so there is nothing to
/// check against; this is not an error.
pub(crate) fn verify_chunk_checksum(index: usize, raw: &[u8], header: &BLTEHeader) -> Result<()> {
    let Some(info) = header.get_chunk_info(index) else {
        return Ok(());
    };

    let digest = casc_crypto::md5compat::compute(raw);
    if digest.0 != info.compressed_hash {
        return Err(Error::ChecksumMismatch {
            expected: hex::encode(info.compressed_hash),
            actual: hex::encode(digest.0),
        });
    }

    Ok(())
}

/// Decode one chunk's raw bytes (encoding header + payload) into plaintext.
pub(crate) fn decode_chunk(
    raw: &[u8],
    expected_size: usize,
    chunk_index: u32,
    logical_offset: u64,
    keys: &KeyService,
    verify: bool,
) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(raw);
    let mode = ChunkEncodingHeader::parse(&mut cursor)?;
    let body = &raw[cursor.position() as usize..];

    match mode {
        ChunkEncodingHeader::None => {
            check_size(body, expected_size)?;
            Ok(body.to_vec())
        }
        ChunkEncodingHeader::ZLib => decode_zlib(body, expected_size),
        ChunkEncodingHeader::Lz4hc => decode_lz4(body, expected_size),
        ChunkEncodingHeader::Frame => decode_frame(body, keys, verify),
        ChunkEncodingHeader::Encrypted(enc) => {
            decode_encrypted(&enc, body, expected_size, chunk_index, logical_offset, keys, verify)
        }
    }
}

fn decode_zlib(body: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(body);
    let mut out = if expected_size > 0 {
        Vec::with_capacity(expected_size)
    } else {
        Vec::new()
    };
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::DecompressionFailed(e.to_string()))?;
    check_size(&out, expected_size)?;
    Ok(out)
}

fn decode_lz4(body: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    if expected_size == 0 {
        return Err(Error::DecompressionFailed(
            "LZ4HC chunk has no known decompressed size".into(),
        ));
    }

    lz4_flex::block::decompress(body, expected_size).map_err(|e| Error::DecompressionFailed(e.to_string()))
}

fn decode_frame(body: &[u8], keys: &KeyService, verify: bool) -> Result<Vec<u8>> {
    let length = body.len() as u64;
    let mut nested_header_cursor = Cursor::new(body);
    let header = BLTEHeader::parse(&mut nested_header_cursor)?;
    decode_all_chunks(body, &header, length, keys, verify)
}

fn decode_encrypted(
    enc: &EncryptedChunkHeader,
    body: &[u8],
    expected_size: usize,
    chunk_index: u32,
    logical_offset: u64,
    keys: &KeyService,
    verify: bool,
) -> Result<Vec<u8>> {
    if body.is_empty() {
        return Err(Error::InvalidEncryptedBlock("missing cipher type byte".into()));
    }
    let cipher_type = body[0];
    let mut plaintext = body[1..].to_vec();

    let key_name = key_name_from_bytes(enc.key_name())?;
    let key = match keys.get_key(key_name) {
        Some(key) => *key,
        None => {
            warn!(
                key_name = format!("{key_name:016x}"),
                "decryption key not found, substituting zero-filled content"
            );
            return Ok(vec![0u8; expected_size]);
        }
    };

    match cipher_type {
        b'S' => {
            let iv = iv_array_4(enc.iv())?;
            casc_crypto::decrypt_salsa20(&mut plaintext, &key, &iv, chunk_index)?;
        }
        b'A' => {
            let iv = iv_array_8(enc.iv())?;
            casc_crypto::decrypt_aes_ctr(&mut plaintext, &key, &iv, logical_offset)?;
        }
        other => return Err(Error::UnsupportedEncryptionType(other)),
    }

    decode_chunk(&plaintext, expected_size, chunk_index, logical_offset, keys, verify)
}

fn key_name_from_bytes(bytes: &[u8]) -> Result<u64> {
    if bytes.len() != 8 {
        return Err(Error::InvalidEncryptedBlock(format!(
            "key name must be 8 bytes, got {}",
            bytes.len()
        )));
    }
    let mut cursor = Cursor::new(bytes);
    Ok(cursor.read_u64::<LittleEndian>()?)
}

fn iv_array_4(bytes: &[u8]) -> Result<[u8; 4]> {
    bytes
        .try_into()
        .map_err(|_| Error::InvalidEncryptedBlock(format!("Salsa20 IV must be 4 bytes, got {}", bytes.len())))
}

fn iv_array_8(bytes: &[u8]) -> Result<[u8; 8]> {
    bytes
        .try_into()
        .map_err(|_| Error::InvalidEncryptedBlock(format!("AES-CTR IV must be 8 bytes, got {}", bytes.len())))
}

fn check_size(out: &[u8], expected_size: usize) -> Result<()> {
    if expected_size != 0 && out.len() != expected_size {
        return Err(Error::TruncatedData {
            expected: expected_size,
            actual: out.len(),
        });
    }
    Ok(())
}

/// Decode every chunk of a fully in-memory BLTE stream (used for nested
/// frame chunks, which are self-contained).
pub(crate) fn decode_all_chunks(
    data: &[u8],
    header: &BLTEHeader,
    total_length: u64,
    keys: &KeyService,
    verify: bool,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(header.total_decompressed_size() as usize);

    for index in 0..header.chunk_count() {
        let start = header
            .chunk_data_offset(index)
            .ok_or(Error::ChunkIndexOutOfRange(index))?;
        let end = header.chunk_data_offset(index + 1).unwrap_or(total_length);
        let raw = &data[start as usize..end as usize];

        if verify {
            verify_chunk_checksum(index, raw, header)?;
        }

        let expected_size = header
            .get_chunk_info(index)
            .map_or(0, |info| info.decompressed_size as usize);
        let logical_offset = header.get_chunk_info(index).map_or(0, |info| info.decompressed_offset);

        out.extend(decode_chunk(raw, expected_size, index as u32, logical_offset, keys, verify)?);
    }

    Ok(out)
}
