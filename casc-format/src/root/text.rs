//! Plain-text listfile root handler: wraps
//! [`crate::listfile::ListfileNameResolver`] for the closed
//! [`super::RootHandler`] enum. Unlike the other handlers this resolves a
//! path only as far as a file-data-id; the caller still needs the encoding
//! table to get from there to a CKey.

pub use crate::listfile::{ListfileNameResolver, listfile_normalise};
use crate::Result;
use std::io::BufRead;

pub struct ListfileRoot(ListfileNameResolver);

impl ListfileRoot {
    pub fn new<T: BufRead>(f: &mut T) -> Result<Self> {
        Ok(Self(ListfileNameResolver::new(f)?))
    }

    pub fn get_by_path(&self, path: &str) -> Option<u32> {
        self.0.get_fid_from_path(path)
    }

    pub fn get_path(&self, fid: u32) -> Option<&str> {
        self.0.get_path_for_fid(fid)
    }
}
