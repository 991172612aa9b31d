//! The local tarball cache.
//!
//! Each repository gets its own directory below the cache root:
//!
//! ```text
//! <cacheRoot>/<site>/<user>/<name>/
//!   map.json        { "<ref>": "<hash>", ... }
//!   access.json     { "<ref>": "<ISO-8601 timestamp>", ... }
//!   <hash>.tar.gz   one per commit some ref still maps to
//! ```
//!
//! [`CacheIndex`] reads and writes that directory, [`CacheManager`] decides
//! between the cache, a download and failing in offline mode.

mod index;
mod manager;

pub use index::{CacheIndex, RecordOutcome};
pub use manager::{
    is_full_hash, select_ref, CacheManager, CacheOptions, Tarball, TarballSource,
};
