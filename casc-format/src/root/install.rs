//! Install-manifest root handler: wraps [`crate::install::InstallManifest`]
//! for the closed [`super::RootHandler`] enum.

pub use crate::install::*;

pub struct InstallRoot(pub InstallManifest);

impl InstallRoot {
    pub fn parse(data: &[u8]) -> crate::Result<Self> {
        Ok(Self(InstallManifest::parse(data)?))
    }
}
