//! Re-export of the `md5` crate, so callers reach content/checksum hashing
//! through this crate's boundary instead of depending on `md5` directly.

pub use md5::*;
