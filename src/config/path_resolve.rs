// src/config/path_resolve.rs

use crate::constants::CACHE_DIR_ENV;
use crate::errors::{io_error_with_path, ConfigError, Result};
use crate::source::Repository;
use directories::ProjectDirs;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Determines the root directory of the tarball cache.
///
/// The order of precedence is:
/// 1. `explicit` (from `--cache-dir`).
/// 2. The `GITSNAP_CACHE_DIR` environment variable.
/// 3. The platform cache directory (e.g. `~/.cache/gitsnap` on Linux).
///
/// Relative paths are made absolute against the current directory.
pub fn determine_cache_dir(explicit: Option<&str>) -> Result<PathBuf> {
    cache_dir_from(explicit, env::var_os(CACHE_DIR_ENV))
}

fn cache_dir_from(explicit: Option<&str>, from_env: Option<OsString>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return absolutize(Path::new(path));
    }
    if let Some(path) = from_env.filter(|p| !p.is_empty()) {
        log::debug!("Using cache root from {}", CACHE_DIR_ENV);
        return absolutize(Path::new(&path));
    }
    let dirs = ProjectDirs::from("", "", "gitsnap").ok_or(ConfigError::NoCacheDir)?;
    Ok(dirs.cache_dir().to_path_buf())
}

/// Resolves the destination directory.
///
/// Defaults to the last segment of the repository name, relative to the
/// current directory.
///
/// # Examples
/// ```
/// use gitsnap::config::resolve_dest;
/// use gitsnap::source::parse;
///
/// let repo = parse("user/my-app", false, None).unwrap();
/// let dest = resolve_dest(None, &repo).unwrap();
/// assert!(dest.is_absolute());
/// assert!(dest.ends_with("my-app"));
/// ```
pub fn resolve_dest(dest: Option<&str>, repository: &Repository) -> Result<PathBuf> {
    match dest {
        Some(path) => absolutize(Path::new(path)),
        None => {
            let default_name = repository
                .name
                .rsplit('/')
                .next()
                .unwrap_or(&repository.name);
            absolutize(Path::new(default_name))
        }
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|e| io_error_with_path(e, "."))?;
    Ok(cwd.join(path))
}
