//! Diablo III root handler.
//!
//! D3 has no per-product pack example or teacher counterpart; this module
//! is built from the spec text alone (`(asset_id, snoID)` named buckets,
//! `CoreToc.dat` providing `(type, id) -> path`), in the cursor-based
//! parsing idiom the rest of this crate uses (`ioutils::ReadInt` over a
//! `Cursor`).

use crate::{Md5, Result, ioutils::ReadInt};
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// A single `(asset_id, snoID)` bucket entry mapping to a content key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketEntry {
    pub asset_id: u32,
    pub sno_id: i32,
    pub ckey: Md5,
}

/// Diablo III root: named asset buckets plus the `CoreToc.dat` path table.
pub struct D3Root {
    buckets: HashMap<(u32, i32), Md5>,
    core_toc: HashMap<(u32, u32), String>,
}

impl D3Root {
    /// Parse the bucket table (the D3 root file itself).
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let bucket_count = cursor.read_u32le()? as usize;

        let mut buckets = HashMap::with_capacity(bucket_count);
        for _ in 0..bucket_count {
            let asset_id = cursor.read_u32le()?;
            let sno_id = cursor.read_i32le()?;
            let mut ckey = [0u8; 16];
            cursor.read_exact(&mut ckey)?;
            buckets.insert((asset_id, sno_id), ckey);
        }

        Ok(Self {
            buckets,
            core_toc: HashMap::new(),
        })
    }

    /// Parse and merge in a `CoreToc.dat` `(type, id) -> path` table.
    pub fn merge_core_toc(&mut self, data: &[u8]) -> Result<()> {
        let mut cursor = Cursor::new(data);
        let entry_count = cursor.read_u32le()? as usize;

        for _ in 0..entry_count {
            let ty = cursor.read_u32le()?;
            let id = cursor.read_u32le()?;
            let name = crate::utils::read_cstring_from(&mut cursor)?;
            self.core_toc.insert((ty, id), name);
        }

        Ok(())
    }

    /// Look up a content key by its `(asset_id, snoID)` composite key.
    pub fn get_by_id(&self, asset_id: u32, sno_id: i32) -> Option<Md5> {
        self.buckets.get(&(asset_id, sno_id)).copied()
    }

    /// Look up a content key by asset id alone (first matching `snoID`).
    ///
    /// `RootHandler` exposes a single-`u32` file-data-id lookup across all
    /// variants; for D3 this means "some bucket with this asset id", which
    /// is ambiguous when more than one `snoID` shares it. Prefer
    /// [`Self::get_by_id`] when both halves of the composite key are known.
    pub fn get_by_fid(&self, asset_id: u32) -> Option<Md5> {
        self.buckets
            .iter()
            .find(|((a, _), _)| *a == asset_id)
            .map(|(_, ckey)| *ckey)
    }

    /// Resolve a `CoreToc.dat` path for a `(type, id)` pair.
    pub fn path_for(&self, ty: u32, id: u32) -> Option<&str> {
        self.core_toc.get(&(ty, id)).map(String::as_str)
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bucket_data() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&2u32.to_le_bytes());

        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&(-1i32).to_le_bytes());
        data.extend_from_slice(&[0xAA; 16]);

        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&[0xBB; 16]);

        data
    }

    #[test]
    fn parses_buckets() {
        let root = D3Root::parse(&sample_bucket_data()).unwrap();
        assert_eq!(root.bucket_count(), 2);
        assert_eq!(root.get_by_id(1, -1), Some([0xAA; 16]));
        assert_eq!(root.get_by_id(2, 0), Some([0xBB; 16]));
        assert_eq!(root.get_by_id(3, 0), None);
    }

    #[test]
    fn merges_core_toc() {
        let mut root = D3Root::parse(&sample_bucket_data()).unwrap();

        let mut toc = Vec::new();
        toc.extend_from_slice(&1u32.to_le_bytes());
        toc.extend_from_slice(&7u32.to_le_bytes());
        toc.extend_from_slice(b"Monster/Zombie.acr\0");

        root.merge_core_toc(&toc).unwrap();
        assert_eq!(root.path_for(1, 7), Some("Monster/Zombie.acr"));
        assert_eq!(root.path_for(1, 8), None);
    }
}
