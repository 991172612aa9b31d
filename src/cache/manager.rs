// src/cache/manager.rs
//! Turns a repository request into a local tarball: ref resolution, cache reuse,
//! downloads and index maintenance.

use super::index::CacheIndex;
use crate::constants::MIN_HASH_PREFIX_LEN;
use crate::errors::{io_error_with_path, Error, Result};
use crate::events::{CloneEvent, EventSink};
use crate::git::{RefKind, RemoteRef, Transport};
use crate::source::Repository;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempDirBuilder, TempDir};

/// Whether a full 40-character hex commit hash was given.
///
/// # Examples
/// ```
/// use gitsnap::cache::is_full_hash;
///
/// assert!(is_full_hash("0123456789abcdef0123456789abcdef01234567"));
/// assert!(!is_full_hash("0123456"));
/// assert!(!is_full_hash("main"));
/// ```
pub fn is_full_hash(reference: &str) -> bool {
    reference.len() == 40 && reference.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Where the tarball came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarballSource {
    /// Reused from the cache.
    Cached,
    /// Freshly downloaded.
    Downloaded,
}

/// A tarball ready for extraction.
///
/// For runs without cache the tarball lives in a temporary directory owned by
/// this value and is deleted when it is dropped.
#[derive(Debug)]
pub struct Tarball {
    pub hash: String,
    pub path: PathBuf,
    pub source: TarballSource,
    scratch: Option<TempDir>,
}

impl Tarball {
    /// Whether the tarball is deleted once this value is dropped.
    pub fn is_temporary(&self) -> bool {
        self.scratch.is_some()
    }
}

/// Options of a single acquisition.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Cache root; the repository uses `<root>/<site>/<user>/<name>`.
    pub root: PathBuf,
    /// Keep the tarball and update the index.
    pub cache: bool,
    /// Never call the transport.
    pub offline: bool,
    /// Proxy for the download.
    pub proxy: Option<String>,
}

/// Drives hash resolution and tarball acquisition for one clone.
pub struct CacheManager<'a> {
    options: CacheOptions,
    transport: &'a dyn Transport,
    events: &'a dyn EventSink,
}

impl<'a> CacheManager<'a> {
    pub fn new(
        options: CacheOptions,
        transport: &'a dyn Transport,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            options,
            transport,
            events,
        }
    }

    /// The index of `repo`, as currently stored on disk.
    pub fn index_for(&self, repo: &Repository) -> CacheIndex {
        CacheIndex::load(self.options.root.join(repo.cache_subdir()))
    }

    /// Resolves `repo`'s ref and returns a local tarball of that commit.
    ///
    /// # Errors
    /// - [`Error::MissingRef`] if the ref cannot be resolved.
    /// - [`Error::CacheMiss`] in offline mode when the cache cannot serve the request.
    /// - [`Error::CouldNotFetch`] / [`Error::CouldNotDownload`] for transport failures.
    pub fn acquire(&self, repo: &Repository) -> Result<Tarball> {
        let mut index = self.index_for(repo);
        let hash = if self.options.offline {
            self.resolve_offline(repo, &index)?
        } else {
            self.resolve_online(repo, &index)?
        };
        self.events.emit(&CloneEvent::ResolvedHash {
            reference: repo.reference.clone(),
            hash: hash.clone(),
        });

        if !self.options.cache && !self.options.offline {
            return self.download_to_scratch(repo, hash);
        }

        let path = index.tarball_path(&hash);
        if self.options.offline {
            if !path.is_file() {
                return Err(Error::CacheMiss {
                    reference: repo.reference.clone(),
                    path,
                });
            }
            self.events.emit(&CloneEvent::UsingCache {
                hash: hash.clone(),
                tarball: path.clone(),
            });
            return Ok(Tarball {
                hash,
                path,
                source: TarballSource::Cached,
                scratch: None,
            });
        }

        let source = if path.is_file() {
            self.events.emit(&CloneEvent::UsingCache {
                hash: hash.clone(),
                tarball: path.clone(),
            });
            TarballSource::Cached
        } else {
            self.download(repo, &hash, &path)?;
            TarballSource::Downloaded
        };

        let outcome = index.record(&repo.reference, &hash, Utc::now())?;
        if let Some(evicted) = outcome.evicted {
            self.events.emit(&CloneEvent::EvictedTarball { hash: evicted });
        }

        Ok(Tarball {
            hash,
            path,
            source,
            scratch: None,
        })
    }

    /// Resolution without network access: a full hash, or whatever the index recorded.
    pub fn resolve_offline(&self, repo: &Repository, index: &CacheIndex) -> Result<String> {
        if is_full_hash(&repo.reference) {
            return Ok(repo.reference.clone());
        }
        match index.hash_for(&repo.reference) {
            Some(hash) => {
                log::debug!("Offline: '{}' is {} in the cache", repo.reference, hash);
                Ok(hash.to_string())
            }
            None => Err(Error::CacheMiss {
                reference: repo.reference.clone(),
                path: index.map_path(),
            }),
        }
    }

    /// Resolution against the remote ref listing.
    pub fn resolve_online(&self, repo: &Repository, index: &CacheIndex) -> Result<String> {
        if is_full_hash(&repo.reference) {
            return Ok(repo.reference.clone());
        }

        let refs = match self.transport.list_remote_refs(&repo.url) {
            Ok(refs) => refs,
            Err(err @ Error::CouldNotFetch { .. }) => {
                let Some(hash) = index.hash_for(&repo.reference) else {
                    return Err(err);
                };
                self.events.emit(&CloneEvent::CacheFallback {
                    reference: repo.reference.clone(),
                    reason: format!("{:#}", anyhow::Error::new(err)),
                });
                return Ok(hash.to_string());
            }
            Err(err) => return Err(err),
        };

        if let Some(hash) = select_ref(&refs, repo) {
            return Ok(hash.to_string());
        }
        if repo.wants_default_branch() {
            return Err(self.missing(repo));
        }

        self.events.emit(&CloneEvent::HistoricalLookup {
            reference: repo.reference.clone(),
        });
        match self.transport.fetch_commit(&repo.url, &repo.reference)? {
            Some(hash) => Ok(hash),
            None => Err(self.missing(repo)),
        }
    }

    fn missing(&self, repo: &Repository) -> Error {
        Error::MissingRef {
            reference: repo.reference.clone(),
            repo: repo.url.clone(),
        }
    }

    fn archive_url(&self, repo: &Repository, hash: &str) -> Result<String> {
        repo.archive_url(hash).ok_or_else(|| {
            crate::errors::ConfigError::InvalidValue {
                option: "--mode".to_string(),
                reason: format!("tarballs are not supported for host '{}'", repo.site),
            }
            .into()
        })
    }

    fn download(&self, repo: &Repository, hash: &str, dest: &Path) -> Result<()> {
        let url = self.archive_url(repo, hash)?;
        if let Some(proxy) = &self.options.proxy {
            self.events.emit(&CloneEvent::UsingProxy {
                proxy: proxy.clone(),
            });
        }
        self.events.emit(&CloneEvent::Downloading {
            url: url.clone(),
            dest: dest.to_path_buf(),
        });
        self.transport
            .download(&url, dest, self.options.proxy.as_deref())
    }

    /// No-cache runs download into a scratch directory, so a fresh tarball never
    /// replaces one that other refs still use.
    fn download_to_scratch(&self, repo: &Repository, hash: String) -> Result<Tarball> {
        let scratch = TempDirBuilder::new()
            .prefix("gitsnap-tarball-")
            .tempdir()
            .map_err(|e| io_error_with_path(e, std::env::temp_dir()))?;
        let path = scratch.path().join(format!("{}.tar.gz", hash));
        self.download(repo, &hash, &path)?;
        Ok(Tarball {
            hash,
            path,
            source: TarballSource::Downloaded,
            scratch: Some(scratch),
        })
    }
}

/// Picks the hash for `repo`'s ref from a remote listing.
///
/// `HEAD` for the default branch; otherwise an exact name match (tags before
/// other kinds, their hash is already peeled), then, for refs of at least eight
/// characters, a commit hash prefix match.
pub fn select_ref<'r>(refs: &'r [RemoteRef], repo: &Repository) -> Option<&'r str> {
    if repo.wants_default_branch() {
        return refs
            .iter()
            .find(|r| r.kind == RefKind::Head)
            .map(|r| r.hash.as_str());
    }

    let wanted = repo.reference.as_str();
    let named = |kind_filter: fn(&RefKind) -> bool| {
        refs.iter()
            .find(|r| kind_filter(&r.kind) && r.name.as_deref() == Some(wanted))
    };
    if let Some(found) = named(|k| *k == RefKind::Tag).or_else(|| named(|_| true)) {
        return Some(found.hash.as_str());
    }

    if wanted.len() >= MIN_HASH_PREFIX_LEN {
        let lower = wanted.to_lowercase();
        return refs
            .iter()
            .find(|r| r.hash.starts_with(&lower))
            .map(|r| r.hash.as_str());
    }
    None
}
