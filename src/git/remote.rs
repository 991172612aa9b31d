// src/git/remote.rs
//! Parsing of `git ls-remote` output.

use crate::errors::{Error, Result};

/// What kind of ref a listing line names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefKind {
    /// The symbolic `HEAD`, i.e. the default branch.
    Head,
    Branch,
    Tag,
    /// Any other namespace below `refs/` (pull requests, notes, ...).
    Other(String),
}

/// One entry of a remote ref listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub kind: RefKind,
    /// Short name (`main`, `v1.0`), `None` for `HEAD`.
    pub name: Option<String>,
    /// Commit hash. For annotated tags this is the peeled commit, not the tag object.
    pub hash: String,
}

impl RemoteRef {
    pub fn head(hash: impl Into<String>) -> Self {
        Self {
            kind: RefKind::Head,
            name: None,
            hash: hash.into(),
        }
    }

    pub fn branch(name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            kind: RefKind::Branch,
            name: Some(name.into()),
            hash: hash.into(),
        }
    }

    pub fn tag(name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            kind: RefKind::Tag,
            name: Some(name.into()),
            hash: hash.into(),
        }
    }
}

/// Parses the output of `git ls-remote <url>`.
///
/// Each non-empty line is `<hash>\t<refname>`. Peeled tag lines (`refs/tags/v1^{}`)
/// replace the hash of the tag they belong to, so every tag points at a commit.
///
/// # Errors
/// Returns [`Error::BadRef`] for a line that is neither `HEAD` nor below `refs/`.
///
/// # Examples
/// ```
/// use gitsnap::git::{parse_ls_remote, RefKind};
///
/// let refs = parse_ls_remote("aaaa\tHEAD\nbbbb\trefs/heads/main\n").unwrap();
/// assert_eq!(refs[0].kind, RefKind::Head);
/// assert_eq!(refs[1].name.as_deref(), Some("main"));
/// ```
pub fn parse_ls_remote(output: &str) -> Result<Vec<RemoteRef>> {
    let mut refs: Vec<RemoteRef> = Vec::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let bad = || Error::BadRef {
            line: line.to_string(),
        };
        let (hash, refname) = line.split_once('\t').ok_or_else(bad)?;
        let hash = hash.trim();
        let refname = refname.trim();
        if hash.is_empty() {
            return Err(bad());
        }

        if refname == "HEAD" {
            refs.push(RemoteRef::head(hash));
            continue;
        }

        let rest = refname.strip_prefix("refs/").ok_or_else(bad)?;
        let (namespace, name) = rest.split_once('/').ok_or_else(bad)?;
        if namespace.is_empty() || name.is_empty() {
            return Err(bad());
        }

        match namespace {
            "heads" => refs.push(RemoteRef::branch(name, hash)),
            "tags" => match name.strip_suffix("^{}") {
                Some(tag) => {
                    match refs
                        .iter_mut()
                        .find(|r| r.kind == RefKind::Tag && r.name.as_deref() == Some(tag))
                    {
                        Some(existing) => existing.hash = hash.to_string(),
                        None => refs.push(RemoteRef::tag(tag, hash)),
                    }
                }
                None => refs.push(RemoteRef::tag(name, hash)),
            },
            other => refs.push(RemoteRef {
                kind: RefKind::Other(other.to_string()),
                name: Some(name.to_string()),
                hash: hash.to_string(),
            }),
        }
    }

    Ok(refs)
}
