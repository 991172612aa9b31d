// src/cache/index.rs
//! The per-repository cache index: `map.json`, `access.json` and the tarballs.

use crate::constants::{CACHE_ACCESS_FILE, CACHE_MAP_FILE};
use crate::errors::{io_error_with_path, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Contents of one index file: ref → hash (`map.json`) or ref → last access
/// time (`access.json`). Stored as a flat JSON object with sorted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
struct RefMap {
    entries: BTreeMap<String, String>,
}

/// What [`CacheIndex::record`] changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordOutcome {
    /// The ref now maps to a different hash than before.
    pub changed: bool,
    /// Hash whose tarball was deleted because no ref points at it any more.
    pub evicted: Option<String>,
}

/// The cache index of one repository, living in `<cacheRoot>/<site>/<user>/<name>`.
///
/// Loading never fails: a missing or unreadable index is treated as empty.
#[derive(Debug, Clone)]
pub struct CacheIndex {
    dir: PathBuf,
    map: RefMap,
    access: RefMap,
}

impl CacheIndex {
    /// Loads the index stored in `dir`.
    pub fn load(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let map = read_ref_map(&dir.join(CACHE_MAP_FILE));
        let access = read_ref_map(&dir.join(CACHE_ACCESS_FILE));
        log::debug!(
            "Loaded cache index from '{}' ({} refs)",
            dir.display(),
            map.entries.len()
        );
        Self { dir, map, access }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of `map.json`.
    pub fn map_path(&self) -> PathBuf {
        self.dir.join(CACHE_MAP_FILE)
    }

    /// Where the tarball of `hash` is (or would be) stored.
    pub fn tarball_path(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{}.tar.gz", hash))
    }

    /// The hash `reference` resolved to last time, if any.
    pub fn hash_for(&self, reference: &str) -> Option<&str> {
        self.map.entries.get(reference).map(String::as_str)
    }

    /// When `reference` was last used, as an ISO-8601 string.
    pub fn last_access(&self, reference: &str) -> Option<&str> {
        self.access.entries.get(reference).map(String::as_str)
    }

    /// All known refs and their hashes, sorted by ref.
    pub fn refs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.entries.iter().map(|(r, h)| (r.as_str(), h.as_str()))
    }

    /// Records that `reference` resolved to `hash` at `now` and persists the index.
    ///
    /// The access time is always written. When the hash changed, the tarball of
    /// the previous hash is deleted unless another ref still maps to it; deletion
    /// is best-effort.
    pub fn record(
        &mut self,
        reference: &str,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome> {
        self.access.entries.insert(
            reference.to_string(),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        );

        if self.hash_for(reference) == Some(hash) {
            self.save_access()?;
            return Ok(RecordOutcome::default());
        }

        let previous = self.map.entries.insert(reference.to_string(), hash.to_string());
        let mut outcome = RecordOutcome {
            changed: true,
            evicted: None,
        };

        if let Some(old) = previous {
            // `reference` already maps to the new hash, so any hit is another ref.
            let still_used = self.map.entries.values().any(|h| *h == old);
            if !still_used {
                let stale = self.tarball_path(&old);
                match fs::remove_file(&stale) {
                    Ok(()) => {
                        log::debug!("Removed unreferenced tarball '{}'", stale.display());
                        outcome.evicted = Some(old);
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        log::warn!("Could not remove '{}': {}", stale.display(), e);
                    }
                }
            }
        }

        self.save_access()?;
        self.save_map()?;
        Ok(outcome)
    }

    fn save_map(&self) -> Result<()> {
        write_ref_map(&self.dir, &self.map_path(), &self.map)
    }

    fn save_access(&self) -> Result<()> {
        write_ref_map(&self.dir, &self.dir.join(CACHE_ACCESS_FILE), &self.access)
    }
}

fn read_ref_map(path: &Path) -> RefMap {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return RefMap::default(),
        Err(e) => {
            log::warn!("Could not read '{}': {}", path.display(), e);
            return RefMap::default();
        }
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed cache index '{}': {}", path.display(), e);
        RefMap::default()
    })
}

fn write_ref_map(dir: &Path, path: &Path, map: &RefMap) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| io_error_with_path(e, dir))?;
    let json = serde_json::to_string_pretty(map).map_err(anyhow::Error::from)?;
    fs::write(path, json).map_err(|e| io_error_with_path(e, path))
}
