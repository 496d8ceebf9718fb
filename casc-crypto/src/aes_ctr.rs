//! AES-128 CTR stream cipher support for BLTE encryption (cipher type `A`).

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;

use crate::Result;

type Aes128Ctr = Ctr128BE<Aes128>;

/// Build the per-frame counter block used by BLTE's AES-CTR mode.
///
/// The frame's 8-byte IV is XORed with the frame's logical offset
/// (little-endian), then zero-extended to a 16-byte counter block, matching
/// the IV derivation already used by [`crate::salsa20::init_salsa20`] for the
/// Salsa20 variant.
fn derive_counter_block(iv: &[u8; 8], logical_offset: u64) -> [u8; 16] {
    let mut counter = [0u8; 16];
    counter[..8].copy_from_slice(iv);

    let offset_bytes = logical_offset.to_le_bytes();
    for i in 0..offset_bytes.len() {
        counter[i] ^= offset_bytes[i];
    }

    counter
}

/// Create a BLTE AES-128 CTR cipher for the given key, frame IV, and logical
/// offset of the frame within the decrypted stream.
pub fn init_aes_ctr(key: &[u8; 16], iv: &[u8; 8], logical_offset: u64) -> Aes128Ctr {
    let counter = derive_counter_block(iv, logical_offset);
    Aes128Ctr::new(key.into(), &counter.into())
}

/// Decrypt an in-memory BLTE AES-CTR buffer in-place.
pub fn decrypt_aes_ctr(data: &mut [u8], key: &[u8; 16], iv: &[u8; 8], logical_offset: u64) -> Result<()> {
    let mut cipher = init_aes_ctr(key, iv, logical_offset);
    cipher.try_apply_keystream(data)?;
    Ok(())
}

/// Encrypt an in-memory buffer using BLTE AES-CTR, in-place.
///
/// CTR mode is symmetric: encryption and decryption are the same operation.
pub fn encrypt_aes_ctr(data: &mut [u8], key: &[u8; 16], iv: &[u8; 8], logical_offset: u64) -> Result<()> {
    decrypt_aes_ctr(data, key, iv, logical_offset)
}
