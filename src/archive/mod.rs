//! Reading and extracting commit tarballs.
//!
//! This module provides:
//! - A gzip + tar reader producing entries with fully resolved names ([`Entries`]).
//! - The mapping of archive names to destination-relative paths ([`PathMapper`]).
//! - Extraction that refuses to write outside of the destination ([`extract`]).

mod extract;
#[doc(hidden)]
pub mod fixture;
mod path_map;
mod reader;

pub use extract::{extract, extract_tar, safe_join};
pub use path_map::{normalize_sub_path, PathMapper};
pub use reader::{gunzip, Entries, Entry, EntryKind};
