//! Maps archive entry names to paths relative to the extraction destination.

use super::reader::{Entry, EntryKind};
use crate::constants::PAX_GLOBAL_HEADER_NAME;

/// Normalizes a user-supplied sub-path.
///
/// Backslashes become forward slashes, leading `./` and `/` and trailing `/` are
/// stripped. Returns `None` when nothing is left.
///
/// # Examples
/// ```
/// use gitsnap::archive::normalize_sub_path;
///
/// assert_eq!(normalize_sub_path(".\\src\\lib\\").as_deref(), Some("src/lib"));
/// assert_eq!(normalize_sub_path("/"), None);
/// ```
pub fn normalize_sub_path(raw: &str) -> Option<String> {
    let unified = raw.replace('\\', "/");
    let mut s = unified.as_str();
    loop {
        if let Some(rest) = s.strip_prefix("./") {
            s = rest;
        } else if let Some(rest) = s.strip_prefix('/') {
            s = rest;
        } else {
            break;
        }
    }
    let s = s.trim_end_matches('/');
    if s.is_empty() || s == "." {
        None
    } else {
        Some(s.to_string())
    }
}

/// Strips trailing slashes and leading `./` from an entry name.
fn clean_name(name: &str) -> &str {
    let mut s = name.trim_end_matches('/');
    while let Some(rest) = s.strip_prefix("./") {
        s = rest;
    }
    s
}

/// Decides whether and where each archive entry is written.
///
/// Built by [`PathMapper::scan`], a first pass over the archive that detects the
/// synthetic top-level folder hosting providers wrap tarballs in and whether the
/// requested sub-path names a file. Tar has no index, so this cannot be known
/// before the whole archive has been seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMapper {
    root_prefix: Option<String>,
    sub_path: Option<String>,
    single_file: bool,
}

impl PathMapper {
    /// Runs the classification pass over `entries`.
    pub fn scan<'a, I>(entries: I, sub_path: Option<&str>) -> Self
    where
        I: IntoIterator<Item = Entry<'a>>,
    {
        let mut mapper = PathMapper {
            root_prefix: None,
            sub_path: sub_path.and_then(normalize_sub_path),
            single_file: false,
        };
        let mut prefix_seen = false;

        for entry in entries {
            if entry.kind == EntryKind::Other {
                continue;
            }
            let name = clean_name(&entry.name);
            if !prefix_seen {
                if name.is_empty() || name == "." || name == PAX_GLOBAL_HEADER_NAME {
                    continue;
                }
                prefix_seen = true;
                mapper.root_prefix = name
                    .split('/')
                    .next()
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string);
                log::debug!("Archive root prefix: {:?}", mapper.root_prefix);
            }
            if entry.kind == EntryKind::File {
                if let Some(sub) = &mapper.sub_path {
                    if mapper.relative_to_root(&entry.name) == sub.as_str() {
                        mapper.single_file = true;
                    }
                }
            }
        }
        mapper
    }

    /// The top-level folder stripped from every entry, if one was detected.
    pub fn root_prefix(&self) -> Option<&str> {
        self.root_prefix.as_deref()
    }

    /// The normalized sub-path extraction is restricted to.
    pub fn sub_path(&self) -> Option<&str> {
        self.sub_path.as_deref()
    }

    /// Whether the sub-path names a single file rather than a directory.
    pub fn is_single_file_target(&self) -> bool {
        self.single_file
    }

    /// The entry name with the root prefix removed.
    pub fn relative_to_root<'n>(&self, name: &'n str) -> &'n str {
        let name = clean_name(name);
        match &self.root_prefix {
            Some(prefix) if name == prefix.as_str() => "",
            Some(prefix) => name
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(name),
            None => name,
        }
    }

    /// Output path of a file or directory entry, `None` if it is skipped.
    pub fn map(&self, entry: &Entry<'_>) -> Option<String> {
        match entry.kind {
            EntryKind::File | EntryKind::Directory => self.map_name(&entry.name),
            EntryKind::Other => None,
        }
    }

    /// Output path for an entry name, `None` if it is skipped.
    pub fn map_name(&self, name: &str) -> Option<String> {
        let rel = self.relative_to_root(name);
        let out = match &self.sub_path {
            None => rel,
            Some(sub) if self.single_file => {
                if rel != sub.as_str() {
                    return None;
                }
                rel.rsplit('/').next().unwrap_or(rel)
            }
            Some(sub) => {
                if rel == sub.as_str() {
                    ""
                } else {
                    rel.strip_prefix(sub.as_str())?.strip_prefix('/')?
                }
            }
        };
        if out.is_empty() || out == "." {
            None
        } else {
            Some(out.to_string())
        }
    }
}
