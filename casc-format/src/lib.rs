//! # casc-format
//!
//! Parsers for the CASC/TACT file formats layered above the BLTE frame
//! engine: build/CDN config text files, the encoding table, install
//! manifest, TVFS, community listfiles, and the per-product root handlers
//! that resolve a path or file-data-id to a content key.
//!
//! ## Quick Start
//!
//! ```no_run
//! use casc_format::root::wow6::WowRoot;
//! use casc_format::root::LocaleFlags;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut file = BufReader::new(File::open("path/to/root")?);
//! let root = WowRoot::parse(&mut file, LocaleFlags::any_locale(), false, false)?;
//! println!("file id for path: {:?}", root.get_fid("interface/icons/inv_misc_questionmark.blp"));
//! # Ok(())
//! # }
//! ```

mod error;
mod ioutils;
pub mod config;
pub mod encoding;
pub mod install;
pub mod listfile;
pub mod root;
pub mod tvfs;
pub mod utils;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Length in bytes of an MD5 digest, as used for CKeys and CDN-archive CKeys
/// throughout these formats.
pub const MD5_LENGTH: usize = 16;

/// Length in bytes of a hex-encoded MD5 digest.
pub const MD5_HEX_LENGTH: usize = MD5_LENGTH * 2;

/// An MD5 digest, used as a CKey or CDN content key through this crate.
pub type Md5 = [u8; MD5_LENGTH];

/// A value that may appear once or twice in a config line (e.g. `encoding`,
/// which has an uncompressed and compressed form).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaybePair<T> {
    Solo(T),
    Pair(T, T),
}

impl<T> MaybePair<T> {
    /// The first (or only) value.
    pub fn first(&self) -> &T {
        match self {
            Self::Solo(a) | Self::Pair(a, _) => a,
        }
    }

    /// The second value, if present.
    pub fn second(&self) -> Option<&T> {
        match self {
            Self::Solo(_) => None,
            Self::Pair(_, b) => Some(b),
        }
    }
}

impl<T> From<(T, T)> for MaybePair<T> {
    fn from((a, b): (T, T)) -> Self {
        Self::Pair(a, b)
    }
}
