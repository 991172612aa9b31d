// tests/common.rs

use gitsnap::errors::{Error, Result};
use gitsnap::events::{CloneEvent, EventSink};
use gitsnap::git::{RemoteRef, Transport};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// Helper function to get the binary command
#[allow(dead_code)] // This is used by many integration tests, but not all.
pub fn gitsnap_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("gitsnap"))
}

#[allow(dead_code)]
pub const HASH_X: &str = "1111111111111111111111111111111111111111";
#[allow(dead_code)]
pub const HASH_Y: &str = "2222222222222222222222222222222222222222";

/// Remembers every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CloneEvent>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CloneEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&CloneEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &CloneEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// A `Transport` serving canned refs and archives, counting every call.
#[derive(Default)]
pub struct FakeTransport {
    pub refs: Vec<RemoteRef>,
    /// URL → archive bytes served by `download`.
    pub archives: HashMap<String, Vec<u8>>,
    /// Result of `fetch_commit`.
    pub historical: Option<String>,
    /// Files (relative path → contents) `checkout` materializes.
    pub checkout_files: Vec<(String, String)>,
    pub fail_listing: bool,
    pub list_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
    pub checkout_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refs(mut self, refs: Vec<RemoteRef>) -> Self {
        self.refs = refs;
        self
    }

    pub fn with_archive(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.archives.insert(url.into(), bytes);
        self
    }

    pub fn with_historical(mut self, hash: impl Into<String>) -> Self {
        self.historical = Some(hash.into());
        self
    }

    pub fn with_checkout_file(mut self, path: &str, contents: &str) -> Self {
        self.checkout_files
            .push((path.to_string(), contents.to_string()));
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Total number of calls of any kind.
    pub fn calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
            + self.fetch_calls.load(Ordering::SeqCst)
            + self.download_calls.load(Ordering::SeqCst)
            + self.checkout_calls.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    fn list_remote_refs(&self, repo_url: &str) -> Result<Vec<RemoteRef>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(Error::CouldNotFetch {
                url: repo_url.to_string(),
                source: anyhow::anyhow!("network is unreachable"),
            });
        }
        Ok(self.refs.clone())
    }

    fn fetch_commit(&self, _repo_url: &str, _reference: &str) -> Result<Option<String>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.historical.clone())
    }

    fn download(&self, url: &str, dest: &Path, _proxy: Option<&str>) -> Result<()> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .archives
            .get(url)
            .ok_or_else(|| Error::CouldNotDownload {
                url: url.to_string(),
                source: anyhow::anyhow!("HTTP status 404 Not Found"),
            })?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(anyhow::Error::from)?;
        }
        fs::write(dest, bytes).map_err(anyhow::Error::from)?;
        Ok(())
    }

    fn checkout(&self, _repo_url: &str, _reference: Option<&str>, dir: &Path) -> Result<()> {
        self.checkout_calls.fetch_add(1, Ordering::SeqCst);
        fs::create_dir_all(dir.join(".git")).map_err(anyhow::Error::from)?;
        fs::write(dir.join(".git/HEAD"), "ref: refs/heads/main").map_err(anyhow::Error::from)?;
        for (path, contents) in &self.checkout_files {
            let target = dir.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(anyhow::Error::from)?;
            }
            fs::write(target, contents).map_err(anyhow::Error::from)?;
        }
        Ok(())
    }
}
