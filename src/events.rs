//! Structured progress notifications emitted while cloning.
//!
//! The core reports what it is doing through an [`EventSink`] instead of
//! printing, so callers decide how (and whether) to display it.

use std::fmt;
use std::path::PathBuf;

/// How noteworthy an event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
}

/// Something that happened during a clone.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CloneEvent {
    /// The destination was not empty but `force` was set.
    DestNotEmpty { dest: PathBuf },
    /// Downloads go through a proxy.
    UsingProxy { proxy: String },
    /// A ref was resolved to a commit hash.
    ResolvedHash { reference: String, hash: String },
    /// The ref was not in the remote listing; trying a shallow fetch of it.
    HistoricalLookup { reference: String },
    /// Listing remote refs failed; the hash recorded in the cache index is used instead.
    CacheFallback { reference: String, reason: String },
    /// A cached tarball is reused.
    UsingCache { hash: String, tarball: PathBuf },
    /// A tarball is being downloaded.
    Downloading { url: String, dest: PathBuf },
    /// A tarball no ref points at any more was deleted.
    EvictedTarball { hash: String },
    /// A tarball is being extracted.
    Extracting { tarball: PathBuf, dest: PathBuf },
    /// Git mode: the external `git` binary is used.
    CloningWithGit { url: String },
    /// The clone finished.
    Cloned {
        source: String,
        dest: PathBuf,
        files: usize,
    },
}

impl CloneEvent {
    pub fn severity(&self) -> Severity {
        match self {
            CloneEvent::DestNotEmpty { .. }
            | CloneEvent::HistoricalLookup { .. }
            | CloneEvent::CacheFallback { .. } => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for CloneEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloneEvent::DestNotEmpty { dest } => write!(
                f,
                "destination directory '{}' is not empty, continuing because of --force",
                dest.display()
            ),
            CloneEvent::UsingProxy { proxy } => write!(f, "using proxy {}", proxy),
            CloneEvent::ResolvedHash { reference, hash } => {
                write!(f, "resolved '{}' to {}", reference, hash)
            }
            CloneEvent::HistoricalLookup { reference } => write!(
                f,
                "'{}' is not a branch or tag, trying to fetch it as a commit",
                reference
            ),
            CloneEvent::CacheFallback { reference, reason } => write!(
                f,
                "could not list remote refs ({}), using cached commit hash for '{}'",
                reason, reference
            ),
            CloneEvent::UsingCache { hash, tarball } => {
                write!(f, "using cached tarball for {} ({})", hash, tarball.display())
            }
            CloneEvent::Downloading { url, dest } => {
                write!(f, "downloading {} to {}", url, dest.display())
            }
            CloneEvent::EvictedTarball { hash } => {
                write!(f, "removed unreferenced tarball {}.tar.gz", hash)
            }
            CloneEvent::Extracting { tarball, dest } => {
                write!(f, "extracting {} to {}", tarball.display(), dest.display())
            }
            CloneEvent::CloningWithGit { url } => write!(f, "cloning {} with git", url),
            CloneEvent::Cloned {
                source,
                dest,
                files,
            } => write!(
                f,
                "cloned {} to {} ({} entries)",
                source,
                dest.display(),
                files
            ),
        }
    }
}

/// Receives [`CloneEvent`]s.
///
/// Implemented for closures, so a quick sink is just `&|e: &CloneEvent| ...`.
///
/// # Examples
/// ```
/// use gitsnap::events::{CloneEvent, EventSink, Severity};
/// use std::sync::Mutex;
///
/// let seen = Mutex::new(Vec::new());
/// let sink = |e: &CloneEvent| seen.lock().unwrap().push(e.severity());
/// sink.emit(&CloneEvent::UsingProxy { proxy: "http://proxy:3128".into() });
/// assert_eq!(*seen.lock().unwrap(), vec![Severity::Info]);
/// ```
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &CloneEvent);
}

impl<F> EventSink for F
where
    F: Fn(&CloneEvent) + Send + Sync,
{
    fn emit(&self, event: &CloneEvent) {
        self(event)
    }
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &CloneEvent) {
        match event.severity() {
            Severity::Info => log::info!("{}", event),
            Severity::Warn => log::warn!("{}", event),
        }
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: &CloneEvent) {}
}
