//! Hash, cipher, and key-ring primitives for CASC/BLTE.
//!
//! This crate provides:
//! - Jenkins96 (lookup3 `hashlittle2`) file-path hashing
//! - Salsa20 stream cipher implementation for BLTE mode `E` cipher `S`
//! - AES-128 CTR stream cipher implementation for BLTE mode `E` cipher `A`
//! - A key ring mapping 64-bit key names to 16-byte keys, with hardcoded
//!   well-known WoW keys and loaders for external key files

pub mod aes_ctr;
pub mod error;
pub mod jenkins;
pub mod key_service;
pub mod keys;
pub mod md5compat;
pub mod salsa20;

pub use aes_ctr::{decrypt_aes_ctr, encrypt_aes_ctr};
pub use error::CryptoError;
pub use jenkins::{hash_path, hashlittle, hashlittle2};
pub use key_service::KeyService;
pub use salsa20::{decrypt_salsa20, encrypt_salsa20};

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
