//! Whole-file decoded-content cache shared across a `Storage`'s handles.

mod lockfree_cache;

pub use lockfree_cache::{CacheStats, LockFreeCache};
