//! Index file parsing and management for CASC storage

mod group_index;
mod idx_parser;
mod key_index;

pub use group_index::GroupIndex;
pub use idx_parser::IdxParser;
pub use key_index::{CKeyEntry, KeyIndex};
