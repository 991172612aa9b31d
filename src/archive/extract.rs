//! Writes the selected part of a tarball to disk.

use super::path_map::PathMapper;
use super::reader::{gunzip, Entries, EntryKind};
use crate::errors::{io_error_with_path, Error, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// An entry that passed the path checks and will be written.
struct Planned<'a> {
    rel: String,
    target: PathBuf,
    kind: EntryKind,
    mode: u32,
    data: &'a [u8],
}

/// Extracts a `.tar.gz` file into `dest`, optionally restricted to `sub_path`.
///
/// Returns the destination-relative paths that were written, in archive order.
/// An empty list means nothing matched; callers decide whether that is an error.
///
/// # Errors
/// Returns [`Error::BadTarPath`] before anything is written if any selected entry
/// would land outside of `dest`, and [`Error::Io`] for read, decompression and
/// write failures.
pub fn extract(archive: &Path, dest: &Path, sub_path: Option<&str>) -> Result<Vec<String>> {
    log::debug!(
        "Extracting '{}' into '{}' (sub-path: {:?})",
        archive.display(),
        dest.display(),
        sub_path
    );
    let compressed = fs::read(archive).map_err(|e| io_error_with_path(e, archive))?;
    let tar = gunzip(&compressed).map_err(|e| io_error_with_path(e, archive))?;
    extract_tar(&tar, dest, sub_path)
}

/// Extracts an already decompressed tar buffer. See [`extract`].
pub fn extract_tar(tar: &[u8], dest: &Path, sub_path: Option<&str>) -> Result<Vec<String>> {
    fs::create_dir_all(dest).map_err(|e| io_error_with_path(e, dest))?;
    let root = dest
        .canonicalize()
        .map_err(|e| io_error_with_path(e, dest))?;

    let mapper = PathMapper::scan(Entries::new(tar), sub_path);

    let mut plan = Vec::new();
    for entry in Entries::new(tar) {
        let Some(rel) = mapper.map(&entry) else {
            if entry.kind == EntryKind::Other {
                log::debug!("Skipping unsupported entry '{}'", entry.name);
            }
            continue;
        };
        let target = safe_join(&root, &rel)?;
        plan.push(Planned {
            rel,
            target,
            kind: entry.kind,
            mode: entry.mode,
            data: entry.data,
        });
    }

    // A path may appear more than once; the last occurrence wins, as with `tar -x`.
    let mut seen = HashSet::new();
    let mut deduped: Vec<Planned<'_>> = plan
        .into_iter()
        .rev()
        .filter(|p| seen.insert(p.rel.clone()))
        .collect();
    deduped.reverse();

    for dir in deduped.iter().filter(|p| p.kind == EntryKind::Directory) {
        fs::create_dir_all(&dir.target).map_err(|e| io_error_with_path(e, &dir.target))?;
    }

    deduped
        .par_iter()
        .filter(|p| p.kind == EntryKind::File)
        .try_for_each(write_file)?;

    log::debug!("Extracted {} entries", deduped.len());
    Ok(deduped.into_iter().map(|p| p.rel).collect())
}

/// Joins `rel` onto `root`, refusing anything that does not stay strictly inside it.
///
/// # Examples
/// ```
/// use gitsnap::archive::safe_join;
/// use std::path::Path;
///
/// let root = Path::new("/tmp/out");
/// assert_eq!(safe_join(root, "a/b.txt").unwrap(), root.join("a").join("b.txt"));
/// assert!(safe_join(root, "../etc/passwd").is_err());
/// assert!(safe_join(root, "/etc/passwd").is_err());
/// assert!(safe_join(root, ".").is_err());
/// ```
pub fn safe_join(root: &Path, rel: &str) -> Result<PathBuf> {
    let bad = || Error::BadTarPath {
        path: rel.to_string(),
    };
    if rel.starts_with('/') || rel.starts_with('\\') || Path::new(rel).is_absolute() {
        return Err(bad());
    }

    let mut target = root.to_path_buf();
    for segment in rel.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return Err(bad()),
            _ => target.push(segment),
        }
    }

    if target == root || !target.starts_with(root) {
        log::warn!(
            "Archive entry '{}' resolves outside of '{}'",
            rel,
            root.display()
        );
        return Err(bad());
    }
    Ok(target)
}

fn write_file(planned: &Planned<'_>) -> Result<()> {
    if let Some(parent) = planned.target.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error_with_path(e, parent))?;
    }
    fs::write(&planned.target, planned.data)
        .map_err(|e| io_error_with_path(e, &planned.target))?;
    restore_mode(&planned.target, planned.mode);
    Ok(())
}

#[cfg(unix)]
fn restore_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    if mode == 0 {
        return;
    }
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777)) {
        log::debug!("Could not set mode {:o} on '{}': {}", mode, path.display(), e);
    }
}

#[cfg(not(unix))]
fn restore_mode(_path: &Path, _mode: u32) {}
