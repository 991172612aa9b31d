//! The fixed set of hosting providers `gitsnap` knows how to download tarballs from.

/// A supported hosting provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Host {
    GitHub,
    GitLab,
    Bitbucket,
    SourceHut,
    Codeberg,
}

const ALL: [Host; 5] = [
    Host::GitHub,
    Host::GitLab,
    Host::Bitbucket,
    Host::SourceHut,
    Host::Codeberg,
];

impl Host {
    /// Looks up a host by its canonical short site name (`github`, `git.sr`, ...).
    pub fn from_site(site: &str) -> Option<Host> {
        ALL.iter().copied().find(|h| h.site() == site)
    }

    /// The canonical short site name, which is also the first cache directory level.
    pub fn site(&self) -> &'static str {
        match self {
            Host::GitHub => "github",
            Host::GitLab => "gitlab",
            Host::Bitbucket => "bitbucket",
            Host::SourceHut => "git.sr",
            Host::Codeberg => "codeberg",
        }
    }

    /// The top-level-domain suffix completing [`Host::site`] into a domain.
    pub fn suffix(&self) -> &'static str {
        match self {
            Host::GitHub | Host::GitLab => "com",
            Host::Bitbucket | Host::Codeberg => "org",
            Host::SourceHut => "ht",
        }
    }

    /// The URL of the commit tarball for `hash`, given the repository's HTTPS URL.
    pub fn archive_url(&self, repo_url: &str, hash: &str) -> String {
        match self {
            Host::GitLab => format!("{}/repository/archive.tar.gz?ref={}", repo_url, hash),
            Host::Bitbucket => format!("{}/get/{}.tar.gz", repo_url, hash),
            Host::GitHub | Host::SourceHut | Host::Codeberg => {
                format!("{}/archive/{}.tar.gz", repo_url, hash)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_lookup_round_trips() {
        for host in ALL {
            assert_eq!(Host::from_site(host.site()), Some(host));
        }
        assert_eq!(Host::from_site("example"), None);
    }

    #[test]
    fn test_archive_url_shapes() {
        let hash = "0123456789abcdef0123456789abcdef01234567";
        assert_eq!(
            Host::GitHub.archive_url("https://github.com/u/r", hash),
            format!("https://github.com/u/r/archive/{}.tar.gz", hash)
        );
        assert_eq!(
            Host::GitLab.archive_url("https://gitlab.com/u/r", hash),
            format!("https://gitlab.com/u/r/repository/archive.tar.gz?ref={}", hash)
        );
        assert_eq!(
            Host::Bitbucket.archive_url("https://bitbucket.org/u/r", hash),
            format!("https://bitbucket.org/u/r/get/{}.tar.gz", hash)
        );
    }
}
