//! The `gitsnap` prelude for convenient library usage.
//!
//! This module re-exports the most commonly used types, traits, and functions
//! from the `gitsnap` library.
//!
//! # Example
//!
//! ```
//! use gitsnap::prelude::*;
//! # fn main() -> Result<()> {
//!
//! let repo = parse("gitlab:user/project/docs#v2", false, None)?;
//! assert_eq!(repo.sub_path.as_deref(), Some("docs"));
//!
//! let config = ConfigBuilder::new()
//!     .source("gitlab:user/project#v2")
//!     .dest("/tmp/project")
//!     .cache_dir("/tmp/gitsnap-cache")
//!     .build()?;
//! assert_eq!(config.effective_mode(), Mode::Tar);
//!
//! # Ok(())
//! # }
//! ```

pub use crate::archive::{extract, safe_join, Entries, Entry, EntryKind, PathMapper};
pub use crate::cache::{CacheIndex, CacheManager, CacheOptions, TarballSource};
pub use crate::config::{Config, ConfigBuilder, Mode};
pub use crate::errors::{Error, ErrorCode, Result};
pub use crate::events::{CloneEvent, EventSink, LogSink, NoOpSink, Severity};
pub use crate::git::{RemoteRef, SystemTransport, Transport};
pub use crate::progress::{NoOpProgress, ProgressReporter};
pub use crate::source::{parse, Host, Repository};
pub use crate::{check_destination, clone, run, CloneSummary};
