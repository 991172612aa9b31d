//! `gitsnap` is a library and command-line tool for fetching a snapshot of a
//! remote git repository (or a subdirectory or single file within it) without
//! its history.
//!
//! A clone runs through a short pipeline:
//! 1.  **Parse**: the source specifier (`github:user/repo/sub/dir#ref`) becomes a
//!     [`source::Repository`].
//! 2.  **Resolve**: the ref is turned into a commit hash, from the remote ref
//!     listing or the local cache ([`cache::CacheManager`]).
//! 3.  **Acquire**: the commit tarball is reused from the cache or downloaded.
//! 4.  **Extract**: the requested part of the tarball is written to the
//!     destination, refusing any entry that would land outside of it
//!     ([`archive::extract`]).
//!
//! Hosts without tarball support (or `Mode::Git`) use a shallow `git clone`
//! instead of steps 2 to 4.
//!
//! Network and `git` access go through the [`git::Transport`] trait and progress
//! is reported as [`events::CloneEvent`]s, so both can be replaced by callers.
//!
//! # Example: Library Usage
//!
//! ```no_run
//! use gitsnap::events::LogSink;
//! use gitsnap::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .source("github:rust-lang/rustlings/exercises#main")
//!     .dest("/tmp/rustlings-exercises")
//!     .build()
//!     .unwrap();
//!
//! let summary = gitsnap::run(&config, None, &LogSink).unwrap();
//! println!(
//!     "{} files from {:?}",
//!     summary.written.len(),
//!     summary.hash
//! );
//! ```

pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod git;
pub mod prelude;
pub mod progress;
pub mod source;

// Re-export key public types for easier use as a library
pub use cache::TarballSource;
pub use config::{Config, ConfigBuilder, Mode};
pub use source::Repository;

use crate::cache::{CacheManager, CacheOptions};
use crate::errors::{io_error_with_path, ConfigError, Error, Result};
use crate::events::{CloneEvent, EventSink};
use crate::git::{SystemTransport, Transport};
use crate::progress::ProgressReporter;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a finished clone did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneSummary {
    /// The repository that was cloned.
    pub repository: Repository,
    /// Where the files were written.
    pub dest: PathBuf,
    /// The mode that was actually used (never [`Mode::Auto`]).
    pub mode: Mode,
    /// The resolved commit hash (tar mode only).
    pub hash: Option<String>,
    /// Where the tarball came from (tar mode only).
    pub tarball: Option<TarballSource>,
    /// Destination-relative paths that were written.
    pub written: Vec<String>,
}

/// Fails with [`Error::DestNotEmpty`] if `dest` exists and has entries, unless `force` is set.
///
/// A missing destination is fine; it is created by the extraction.
pub fn check_destination(dest: &Path, force: bool, events: &dyn EventSink) -> Result<()> {
    let mut entries = match fs::read_dir(dest) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_error_with_path(e, dest)),
    };
    if entries.next().is_none() {
        return Ok(());
    }
    if !force {
        return Err(Error::DestNotEmpty {
            dest: dest.to_path_buf(),
        });
    }
    events.emit(&CloneEvent::DestNotEmpty {
        dest: dest.to_path_buf(),
    });
    Ok(())
}

/// Clones according to `config`, using `transport` for all remote access.
///
/// # Errors
/// Any [`Error`]; [`Error::NoFiles`] when nothing was written.
pub fn clone(
    config: &Config,
    transport: &dyn Transport,
    events: &dyn EventSink,
) -> Result<CloneSummary> {
    let repo = &config.repository;
    check_destination(&config.dest, config.force, events)?;

    let mode = config.effective_mode();
    log::debug!("Cloning {} in {:?} mode", repo.url, mode);

    let (hash, tarball, written) = match mode {
        Mode::Git => {
            if config.offline {
                return Err(ConfigError::Conflict {
                    option1: "--offline".to_string(),
                    option2: "git mode".to_string(),
                }
                .into());
            }
            let written = git::clone_with_git(repo, &config.dest, transport, events)?;
            (None, None, written)
        }
        Mode::Tar | Mode::Auto => {
            if repo.host().is_none() {
                return Err(ConfigError::InvalidValue {
                    option: "--mode".to_string(),
                    reason: format!("tarballs are not supported for host '{}'", repo.site),
                }
                .into());
            }
            let manager = CacheManager::new(
                CacheOptions {
                    root: config.cache_dir.clone(),
                    cache: config.cache,
                    offline: config.offline,
                    proxy: config.proxy.clone(),
                },
                transport,
                events,
            );
            let acquired = manager.acquire(repo)?;
            events.emit(&CloneEvent::Extracting {
                tarball: acquired.path.clone(),
                dest: config.dest.clone(),
            });
            let written = archive::extract(&acquired.path, &config.dest, repo.sub_path.as_deref())?;
            // Dropping `acquired` removes a no-cache tarball.
            (Some(acquired.hash.clone()), Some(acquired.source), written)
        }
    };

    if written.is_empty() {
        return Err(Error::NoFiles {
            sub_path: repo.sub_path.clone(),
        });
    }

    events.emit(&CloneEvent::Cloned {
        source: config.source.clone(),
        dest: config.dest.clone(),
        files: written.len(),
    });
    Ok(CloneSummary {
        repository: repo.clone(),
        dest: config.dest.clone(),
        mode,
        hash,
        tarball,
        written,
    })
}

/// Clones according to `config` with the real network transport.
///
/// This is the entry point the command line uses.
pub fn run(
    config: &Config,
    progress: Option<Arc<dyn ProgressReporter>>,
    events: &dyn EventSink,
) -> Result<CloneSummary> {
    let transport = SystemTransport::new().with_progress(progress);
    clone(config, &transport, events)
}
