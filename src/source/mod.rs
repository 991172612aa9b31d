//! Parsing of source specifiers such as `github:user/repo/sub/dir#v1.2.0`.
//!
//! A specifier has an optional host prefix (`https://<host>/`, `git@<host>:` or
//! `<shorthand>:`), a `<user>/<name>` pair, an optional sub-path and an optional
//! `#<ref>`. Parsing produces an immutable [`Repository`] descriptor from which the
//! canonical HTTPS, SSH and archive URLs are derived.

mod host;

pub use host::Host;

use crate::archive::normalize_sub_path;
use crate::cache::is_full_hash;
use crate::constants::{DEFAULT_REF, DEFAULT_SITE};
use crate::errors::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

/// Grammar of a source specifier.
static SOURCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:https://)?([^:/]+\.[^:/]+)/|git@([^:/]+)[:/]|([^/]+):)?([^/\s]+)/([^/\s#]+)((?:/[^/\s#]+)+)?/?(?:#(.+))?$",
    )
    .unwrap()
});

/// Recognised domain suffixes, stripped from the host token to get the short site name.
static SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(com|org|ht)$").unwrap());

/// A remote repository plus the part of it that was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Short hosting-provider name (`github`, `gitlab`, ...), or the host as given.
    pub site: String,
    /// Owner segment.
    pub user: String,
    /// Repository name, never ending in `.git`. Contains `/` for folded subgroups.
    pub name: String,
    /// Branch, tag or commit hash. [`DEFAULT_REF`] for the default branch.
    pub reference: String,
    /// Canonical HTTPS URL.
    pub url: String,
    /// Canonical SSH address.
    pub ssh_url: String,
    /// Normalized path inside the repository to restrict extraction to.
    pub sub_path: Option<String>,
}

impl Repository {
    /// The provider entry for this repository's site, if it is a supported one.
    pub fn host(&self) -> Option<Host> {
        Host::from_site(&self.site)
    }

    /// URL of the commit tarball for `hash`, or `None` for unsupported hosts.
    pub fn archive_url(&self, hash: &str) -> Option<String> {
        self.host().map(|h| h.archive_url(&self.url, hash))
    }

    /// Directory of this repository below the cache root: `<site>/<user>/<name>`.
    pub fn cache_subdir(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.site);
        path.push(&self.user);
        for segment in self.name.split('/') {
            path.push(segment);
        }
        path
    }

    /// Whether the default branch was requested.
    pub fn wants_default_branch(&self) -> bool {
        self.reference == DEFAULT_REF
    }
}

/// Parses a source specifier into a [`Repository`].
///
/// When `subgroup` is set, the first sub-path segment is folded into the
/// repository name (`group/subgroup/repo`); if `explicit_sub_path` is also given,
/// the whole parsed sub-path is folded and the explicit one is used instead.
/// Without `subgroup`, an explicit sub-path simply replaces the parsed one.
///
/// # Errors
/// Returns [`Error::BadSrc`] if the specifier does not match the grammar.
///
/// # Examples
/// ```
/// use gitsnap::source::parse;
///
/// let repo = parse("gitlab:user/project/docs#v1.0", false, None).unwrap();
/// assert_eq!(repo.site, "gitlab");
/// assert_eq!(repo.url, "https://gitlab.com/user/project");
/// assert_eq!(repo.sub_path.as_deref(), Some("docs"));
/// assert_eq!(repo.reference, "v1.0");
/// ```
pub fn parse(src: &str, subgroup: bool, explicit_sub_path: Option<&str>) -> Result<Repository> {
    let caps = SOURCE_RE.captures(src).ok_or_else(|| Error::BadSrc {
        src: src.to_string(),
    })?;

    let host_token = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map_or(DEFAULT_SITE, |m| m.as_str());

    let (site, matched_suffix) = match SUFFIX_RE.captures(host_token) {
        Some(suffix) => {
            let whole = suffix.get(0).map_or(0, |m| m.start());
            (
                host_token[..whole].to_string(),
                suffix.get(1).map(|m| m.as_str().to_string()),
            )
        }
        None => (host_token.to_string(), None),
    };

    let domain = match matched_suffix {
        Some(suffix) => format!("{}.{}", site, suffix),
        None => match Host::from_site(&site) {
            Some(host) => format!("{}.{}", site, host.suffix()),
            None => site.clone(),
        },
    };

    let user = caps[4].to_string();
    let mut name = strip_git_suffix(&caps[5]).to_string();
    let parsed_sub_path = caps.get(6).map(|m| m.as_str().to_string());
    let mut reference = caps
        .get(7)
        .map_or(DEFAULT_REF, |m| m.as_str())
        .to_string();
    if is_full_hash(&reference) {
        reference.make_ascii_lowercase();
    }

    let sub_path = if subgroup {
        let segments: Vec<&str> = parsed_sub_path
            .as_deref()
            .map(|p| p.split('/').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let folded = if explicit_sub_path.is_some() {
            segments.len()
        } else {
            segments.len().min(1)
        };
        for segment in &segments[..folded] {
            name = format!("{}/{}", name, strip_git_suffix(segment));
        }
        match explicit_sub_path {
            Some(explicit) => normalize_sub_path(explicit),
            None => normalize_sub_path(&segments[folded..].join("/")),
        }
    } else {
        match explicit_sub_path {
            Some(explicit) => normalize_sub_path(explicit),
            None => parsed_sub_path.as_deref().and_then(normalize_sub_path),
        }
    };

    // `user`, `name` and the sub-path all become filesystem paths.
    let escapes = |path: &str| path.split('/').any(|s| s == "." || s == "..");
    if escapes(&user) || escapes(&name) || sub_path.as_deref().is_some_and(escapes) {
        return Err(Error::BadSrc {
            src: src.to_string(),
        });
    }

    let url = format!("https://{}/{}/{}", domain, user, name);
    let ssh_url = format!("git@{}:{}/{}", domain, user, name);
    log::debug!(
        "Parsed source '{}' as site={} user={} name={} ref={} sub_path={:?}",
        src,
        site,
        user,
        name,
        reference,
        sub_path
    );

    Ok(Repository {
        site,
        user,
        name,
        reference,
        url,
        ssh_url,
        sub_path,
    })
}

fn strip_git_suffix(name: &str) -> &str {
    name.strip_suffix(".git").unwrap_or(name)
}
