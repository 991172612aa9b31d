//! Defines the core `Config` struct and related types for application configuration.
//!
//! This module consolidates all the settings parsed and validated from the CLI
//! (or set programmatically through [`ConfigBuilder`]), making them available to
//! the rest of the application in a structured and type-safe manner.

use crate::source::Repository;
use std::path::PathBuf;

pub use builder::ConfigBuilder;
mod builder;
mod builder_logic;
mod parsing;
pub mod path_resolve;

pub use path_resolve::{determine_cache_dir, resolve_dest};

/// How the snapshot is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// Tarball for supported hosts, git otherwise.
    #[default]
    Auto,
    /// Download the commit tarball from the hosting provider.
    Tar,
    /// Shallow clone with the external `git` binary.
    Git,
}

/// The main configuration struct for a clone.
///
/// Everything here is resolved: the source is parsed, the destination and the
/// cache root are absolute paths.
#[derive(Debug, Clone)]
pub struct Config {
    /// The source specifier as given.
    pub source: String,
    /// The parsed repository, with any explicit sub-directory already applied.
    pub repository: Repository,
    /// Absolute destination directory.
    pub dest: PathBuf,
    /// Continue even if the destination is not empty.
    pub force: bool,
    /// Keep downloaded tarballs and the ref index in the cache.
    pub cache: bool,
    /// Never touch the network; serve from the cache only.
    pub offline: bool,
    /// Requested mode, see [`Config::effective_mode`].
    pub mode: Mode,
    /// Proxy URL for tarball downloads.
    pub proxy: Option<String>,
    /// Cache root, repositories live in `<cache_dir>/<site>/<user>/<name>`.
    pub cache_dir: PathBuf,
}

impl Config {
    /// Resolves [`Mode::Auto`] against the repository's host.
    pub fn effective_mode(&self) -> Mode {
        match self.mode {
            Mode::Auto if self.repository.host().is_some() => Mode::Tar,
            Mode::Auto => Mode::Git,
            other => other,
        }
    }

    /// The cache directory of this config's repository.
    pub fn repo_cache_dir(&self) -> PathBuf {
        self.cache_dir.join(self.repository.cache_subdir())
    }

    /// Creates a `Config` for testing purposes.
    ///
    /// This function is hidden from public documentation and is intended for
    /// use in tests and doc tests only.
    #[doc(hidden)]
    pub fn new_for_test(repository: Repository, dest: PathBuf, cache_dir: PathBuf) -> Self {
        Self {
            source: format!("{}/{}", repository.user, repository.name),
            repository,
            dest,
            force: false,
            cache: true,
            offline: false,
            mode: Mode::Auto,
            proxy: None,
            cache_dir,
        }
    }
}
