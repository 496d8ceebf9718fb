//! WoW 8.2+ root handler.
//!
//! The on-disk `TSFM` format gained a header version field (10.1.7.50893+)
//! and a split locale/content flag layout (format version 2) over time, but
//! both are variations [`super::wow6::WowRoot`] already parses based on the
//! header it reads — there is no separate binary layout to duplicate here.
//! This thin wrapper exists only so the closed [`super::RootHandler`] enum
//! can name "WoW 8.2+" as its own variant per the product-family contract,
//! without pretending the two share no code.

use super::wow6::{LocaleFlags, WowRoot};
use crate::Result;
use std::io::{Read, Seek};

pub struct Wow8Root(pub WowRoot);

impl Wow8Root {
    pub fn parse<R: Read + Seek>(
        f: &mut R,
        only_locale: LocaleFlags,
        audio_locale: bool,
        override_archive: bool,
    ) -> Result<Self> {
        Ok(Self(WowRoot::parse(f, only_locale, audio_locale, override_archive)?))
    }
}
