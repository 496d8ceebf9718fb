//! Overwatch root handler: APM (application package manifest) + CMF
//! (content manifest format).
//!
//! Like [`super::d3`], this has no pack or teacher counterpart; built from
//! the spec text in this crate's cursor-based parsing idiom. CMF content
//! may be AES-128-CTR encrypted under a per-build key looked up by build id
//! in the caller's key ring, reusing `casc-crypto::aes_ctr` the same way
//! BLTE's `E` mode does.

use crate::{Error, Md5, Result, ioutils::ReadInt};
use casc_crypto::KeyService;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Parsed APM: identifies the build and whether its CMF is encrypted.
#[derive(Debug, Clone)]
pub struct ApplicationPackageManifest {
    pub build_id: u64,
    pub encrypted: bool,
}

impl ApplicationPackageManifest {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let build_id = cursor.read_u64le()?;
        let encrypted = cursor.read_u8()? != 0;
        Ok(Self {
            build_id,
            encrypted,
        })
    }
}

/// Overwatch root: `name_hash -> CKey` content manifest.
pub struct OverwatchRoot {
    apm: ApplicationPackageManifest,
    entries: HashMap<u64, Md5>,
}

impl OverwatchRoot {
    /// Parse the APM, then the (possibly encrypted) CMF content it governs.
    ///
    /// If `apm.encrypted` is set, `cmf` is `[iv: 8 bytes][ciphertext]` and is
    /// decrypted with the key named `apm.build_id` from `keys` before
    /// parsing; a missing key is reported rather than silently zero-filled,
    /// since an empty root would otherwise look like a storage with no
    /// files.
    pub fn parse(apm: &[u8], cmf: &[u8], keys: &KeyService) -> Result<Self> {
        let apm = ApplicationPackageManifest::parse(apm)?;

        let plaintext;
        let body = if apm.encrypted {
            if cmf.len() < 8 {
                return Err(Error::BadMagic);
            }
            let (iv_bytes, ciphertext) = cmf.split_at(8);
            let iv: [u8; 8] = iv_bytes.try_into().unwrap();
            let key = keys
                .get_key(apm.build_id)
                .ok_or(Error::KeyNotFound(apm.build_id))?;

            let mut buf = ciphertext.to_vec();
            casc_crypto::decrypt_aes_ctr(&mut buf, key, &iv, 0)?;
            plaintext = buf;
            plaintext.as_slice()
        } else {
            cmf
        };

        let mut cursor = Cursor::new(body);
        let count = cursor.read_u32le()? as usize;
        let mut entries = HashMap::with_capacity(count);
        for _ in 0..count {
            let name_hash = cursor.read_u64le()?;
            let mut ckey = [0u8; 16];
            cursor.read_exact(&mut ckey)?;
            entries.insert(name_hash, ckey);
        }

        Ok(Self { apm, entries })
    }

    pub fn build_id(&self) -> u64 {
        self.apm.build_id
    }

    /// Look up a content key by the asset's jenkins96 name hash.
    pub fn get_by_hash(&self, name_hash: u64) -> Option<Md5> {
        self.entries.get(&name_hash).copied()
    }

    /// Look up a content key by asset name, hashing it the same way the
    /// other root handlers do.
    pub fn get_by_name(&self, name: &str) -> Option<Md5> {
        self.get_by_hash(crate::utils::jenkins3_hashpath(name))
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_apm(encrypted: bool) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&42u64.to_le_bytes());
        data.push(u8::from(encrypted));
        data
    }

    fn sample_cmf_plaintext(entries: &[(u64, Md5)]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        for (hash, ckey) in entries {
            data.extend_from_slice(&hash.to_le_bytes());
            data.extend_from_slice(ckey);
        }
        data
    }

    #[test]
    fn parses_unencrypted_cmf() {
        let apm = sample_apm(false);
        let cmf = sample_cmf_plaintext(&[(0x1122, [0x11; 16]), (0x3344, [0x22; 16])]);

        let root = OverwatchRoot::parse(&apm, &cmf, &KeyService::empty()).unwrap();
        assert_eq!(root.build_id(), 42);
        assert_eq!(root.entry_count(), 2);
        assert_eq!(root.get_by_hash(0x1122), Some([0x11; 16]));
        assert_eq!(root.get_by_hash(0x9999), None);
    }

    #[test]
    fn parses_encrypted_cmf_with_key() {
        let apm = sample_apm(true);
        let plaintext = sample_cmf_plaintext(&[(0xAABB, [0x33; 16])]);

        let key = [0x77u8; 16];
        let iv = [0x01u8; 8];
        let mut ciphertext = plaintext.clone();
        casc_crypto::encrypt_aes_ctr(&mut ciphertext, &key, &iv, 0).unwrap();

        let mut cmf = iv.to_vec();
        cmf.extend_from_slice(&ciphertext);

        let mut keys = KeyService::empty();
        keys.add_key(42, key);

        let root = OverwatchRoot::parse(&apm, &cmf, &keys).unwrap();
        assert_eq!(root.get_by_hash(0xAABB), Some([0x33; 16]));
    }

    #[test]
    fn missing_key_is_an_error() {
        let apm = sample_apm(true);
        let cmf = vec![0u8; 16];
        let err = OverwatchRoot::parse(&apm, &cmf, &KeyService::empty()).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(42)));
    }
}
