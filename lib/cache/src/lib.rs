//! A semantic cache for the results of basic graph patterns (BGPs).
//!
//! The cache stores the complete solution sequence of a BGP and can answer queries for BGPs that
//! are only partially cached (see [BgpCache::find_subset]). Entries are built incrementally by a
//! single writer while other executions may already wait for them.

mod cache;
mod config;
mod subset;
mod tee;
mod writer;

pub use cache::{BgpCache, CacheRead, CachedBindings};
pub use config::{CacheConfig, DEFAULT_CACHE_MAX_SIZE, DEFAULT_CACHE_TTL};
pub use subset::SubsetMatch;
pub use writer::WriterId;
