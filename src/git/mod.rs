// src/git/mod.rs
//! Everything that talks to a remote repository.
//!
//! This module provides:
//! - The [`Transport`] trait, the seam between the clone logic and the network.
//! - [`SystemTransport`], which lists refs and clones with the external `git`
//!   binary and downloads tarballs with `reqwest`.
//! - Parsing of `git ls-remote` output into [`RemoteRef`]s.
//! - "git mode" cloning ([`clone_with_git`]).

mod clone;
mod download;
mod ops;
mod remote;

pub use clone::clone_with_git;
pub use download::partial_path;
pub use remote::{parse_ls_remote, RefKind, RemoteRef};

use crate::errors::{Error, Result};
use crate::progress::ProgressReporter;
use std::path::Path;
use std::sync::Arc;

/// Network and `git` access used by a clone.
///
/// Implementations must map their failures onto the crate's error codes:
/// [`Error::CouldNotFetch`] for ref listing, [`Error::CouldNotDownload`] for
/// downloads and [`Error::Git`] for checkouts.
pub trait Transport: Send + Sync {
    /// Lists the branches, tags and `HEAD` of the repository at `repo_url`.
    fn list_remote_refs(&self, repo_url: &str) -> Result<Vec<RemoteRef>>;

    /// Resolves a ref that is not a branch or tag tip (e.g. an older commit) by
    /// fetching it. `Ok(None)` if the remote does not know it.
    fn fetch_commit(&self, repo_url: &str, reference: &str) -> Result<Option<String>>;

    /// Downloads `url` to `dest`, following redirects and failing on non-2xx responses.
    fn download(&self, url: &str, dest: &Path, proxy: Option<&str>) -> Result<()>;

    /// Creates a shallow checkout of `repo_url` at `reference` (default branch if
    /// `None`) in the not yet existing directory `dir`.
    fn checkout(&self, repo_url: &str, reference: Option<&str>, dir: &Path) -> Result<()>;
}

/// The real [`Transport`]: `git` processes and HTTPS downloads.
#[derive(Default, Clone)]
pub struct SystemTransport {
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl SystemTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports download progress to `progress`.
    pub fn with_progress(mut self, progress: Option<Arc<dyn ProgressReporter>>) -> Self {
        self.progress = progress;
        self
    }
}

impl Transport for SystemTransport {
    fn list_remote_refs(&self, repo_url: &str) -> Result<Vec<RemoteRef>> {
        let output = ops::ls_remote(repo_url).map_err(|source| Error::CouldNotFetch {
            url: repo_url.to_string(),
            source,
        })?;
        parse_ls_remote(&output)
    }

    fn fetch_commit(&self, repo_url: &str, reference: &str) -> Result<Option<String>> {
        ops::fetch_commit(repo_url, reference).map_err(|source| Error::CouldNotFetch {
            url: repo_url.to_string(),
            source,
        })
    }

    fn download(&self, url: &str, dest: &Path, proxy: Option<&str>) -> Result<()> {
        let wrap = |source| Error::CouldNotDownload {
            url: url.to_string(),
            source,
        };
        let client = download::build_client(proxy).map_err(wrap)?;
        download::download_file(&client, url, dest, self.progress.as_ref()).map_err(wrap)
    }

    fn checkout(&self, repo_url: &str, reference: Option<&str>, dir: &Path) -> Result<()> {
        ops::shallow_checkout(repo_url, reference, dir).map_err(|source| Error::Git { source })
    }
}
