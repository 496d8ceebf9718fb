//! Build/CDN configuration text file parsers (`key = value` lines, `#`
//! comments, a leading `## seqn = N` header).
mod build;
mod cdn;
mod parser;

pub use self::{build::BuildConfig, cdn::CdnConfig};
pub use parser::{
    ConfigParsable, ConfigParser, parse_md5_maybepair_string, parse_md5_pair_string,
    parse_md5_string, parse_md5_u32_pair_string, parse_md5s_string, parse_u32_maybepair_string,
    parse_u32_pair_string, parse_u32s_string,
};
