// src/git/ops.rs
//! Low-level git operations, delegated to the external `git` binary.

use anyhow::{anyhow, Context, Result};
use log::debug;
use std::path::Path;
use std::process::Command;
use tempfile::Builder as TempDirBuilder;

/// Builds a `git` command that never prompts for credentials.
fn git_command() -> Command {
    let mut cmd = Command::new("git");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

/// Runs `git <args>` (optionally inside `cwd`) and returns its stdout.
pub(super) fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<String> {
    let mut cmd = git_command();
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    debug!("Running git {}", args.join(" "));

    let output = cmd
        .output()
        .with_context(|| format!("Failed to run 'git {}', is git installed?", args.join(" ")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "'git {}' exited with {}: {}",
            args.join(" "),
            output.status,
            stderr.trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Lists the refs of a remote repository.
pub(super) fn ls_remote(url: &str) -> Result<String> {
    run_git(&["ls-remote", url], None)
}

/// Looks up a commit that is not a branch or tag tip by fetching it into a throwaway repository.
///
/// Returns `Ok(None)` when the remote does not know `reference`.
pub(super) fn fetch_commit(url: &str, reference: &str) -> Result<Option<String>> {
    let scratch = TempDirBuilder::new()
        .prefix("gitsnap-lookup-")
        .tempdir()
        .context("Failed to create a temporary directory for the commit lookup")?;
    let dir = scratch.path();

    run_git(&["init", "--quiet"], Some(dir))?;
    if let Err(e) = run_git(&["fetch", "--quiet", "--depth", "1", url, reference], Some(dir)) {
        debug!("Shallow fetch of '{}' failed: {:#}", reference, e);
        return Ok(None);
    }
    let hash = run_git(&["rev-parse", "FETCH_HEAD"], Some(dir))?;
    let hash = hash.trim();
    Ok((!hash.is_empty()).then(|| hash.to_string()))
}

/// Materializes a shallow checkout of `url` at `reference` (default branch if `None`) in `dir`.
///
/// `dir` must not exist yet.
pub(super) fn shallow_checkout(url: &str, reference: Option<&str>, dir: &Path) -> Result<()> {
    let dir_str = dir.to_string_lossy().into_owned();
    let mut args = vec!["clone", "--quiet", "--depth", "1"];
    if let Some(r) = reference {
        args.extend(["--branch", r]);
    }
    args.extend([url, dir_str.as_str()]);

    let clone_err = match run_git(&args, None) {
        Ok(_) => return Ok(()),
        Err(e) => e,
    };
    // `--branch` only accepts branch and tag names; fetch anything else directly.
    let Some(reference) = reference else {
        return Err(clone_err);
    };
    debug!(
        "Shallow clone of '{}' failed ({:#}), fetching it instead",
        reference, clone_err
    );

    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to clean up '{}'", dir.display()))?;
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create '{}'", dir.display()))?;
    run_git(&["init", "--quiet"], Some(dir))?;
    run_git(&["fetch", "--quiet", "--depth", "1", url, reference], Some(dir))?;
    run_git(&["checkout", "--quiet", "FETCH_HEAD"], Some(dir))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failing_command_reports_its_arguments() {
        let err = run_git(&["definitely-not-a-git-command"], None).unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-git-command"));
    }

    #[test]
    #[ignore = "requires network access and is slow"]
    fn test_ls_remote_real_repository() -> Result<()> {
        let out = ls_remote("https://github.com/Rich-Harris/degit")?;
        assert!(out.contains("\tHEAD"));
        Ok(())
    }
}
