//! TVFS root handler: wraps [`crate::tvfs::TVFSManifest`] for the closed
//! [`super::RootHandler`] enum.

pub use crate::tvfs::*;

pub struct TvfsRoot(pub TVFSManifest);

impl TvfsRoot {
    pub fn parse(data: &[u8]) -> crate::Result<Self> {
        Ok(Self(TVFSManifest::parse(data)?))
    }
}
