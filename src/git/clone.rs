// src/git/clone.rs
//! "git mode": a shallow clone through the external `git` binary, copied into the
//! destination without its `.git` directory.

use super::Transport;
use crate::archive::safe_join;
use crate::errors::{io_error_with_path, Error, Result};
use crate::events::{CloneEvent, EventSink};
use crate::source::Repository;
use std::fs;
use std::path::Path;
use tempfile::Builder as TempDirBuilder;
use walkdir::WalkDir;

/// Clones `repo` with git and copies the requested part of the checkout into `dest`.
///
/// The checkout lives in a temporary directory that is removed on every exit
/// path. A sub-path naming a file is copied flattened into `dest`, like the
/// tarball extraction does. A sub-path leaving the checkout is
/// [`Error::BadTarPath`].
///
/// Returns the destination-relative paths that were written.
pub fn clone_with_git(
    repo: &Repository,
    dest: &Path,
    transport: &dyn Transport,
    events: &dyn EventSink,
) -> Result<Vec<String>> {
    let scratch = TempDirBuilder::new()
        .prefix("gitsnap-clone-")
        .tempdir()
        .map_err(|e| io_error_with_path(e, std::env::temp_dir()))?;
    let checkout = scratch.path().join("checkout");
    let source = match &repo.sub_path {
        Some(sub) => safe_join(&checkout, sub)?,
        None => checkout.clone(),
    };

    events.emit(&CloneEvent::CloningWithGit {
        url: repo.ssh_url.clone(),
    });
    let reference = (!repo.wants_default_branch()).then_some(repo.reference.as_str());
    transport.checkout(&repo.ssh_url, reference, &checkout)?;

    if !source.exists() {
        log::debug!("'{}' does not exist in the checkout", source.display());
        return Ok(Vec::new());
    }

    fs::create_dir_all(dest).map_err(|e| io_error_with_path(e, dest))?;
    if source.is_file() {
        let Some(file_name) = source.file_name() else {
            return Ok(Vec::new());
        };
        let target = dest.join(file_name);
        fs::copy(&source, &target).map_err(|e| io_error_with_path(e, &target))?;
        return Ok(vec![file_name.to_string_lossy().into_owned()]);
    }

    copy_tree(&source, dest)
    // `scratch` is dropped here, removing the checkout.
}

/// Copies everything below `src` into `dest`, skipping `.git`.
fn copy_tree(src: &Path, dest: &Path) -> Result<Vec<String>> {
    let mut written = Vec::new();
    let walker = WalkDir::new(src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| Error::Git { source: e.into() })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::Git { source: e.into() })?;
        let target = dest.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| io_error_with_path(e, &target))?;
        } else if file_type.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| io_error_with_path(e, parent))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| io_error_with_path(e, &target))?;
        } else {
            log::debug!("Skipping '{}': not a regular file", entry.path().display());
            continue;
        }
        written.push(
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        );
    }
    Ok(written)
}
