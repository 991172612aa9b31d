// src/cli.rs

use crate::config::Mode;
use clap::Parser;

/// Fetch a snapshot of a remote git repository without its history.
///
/// gitsnap downloads the commit tarball of a branch, tag or commit (or does a
/// shallow git clone for hosts without tarballs) and extracts it, or just one
/// subdirectory or file of it, into a local directory. Tarballs are cached, so
/// repeated clones of the same commit work offline.
///
/// SRC examples: user/repo, github:user/repo#v1.0, gitlab:group/repo/docs,
/// https://github.com/user/repo, git@bitbucket.org:user/repo#dev
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to clone: [host:]user/repo[/sub/path][#ref].
    pub src: String,

    /// Destination directory. Defaults to the repository name.
    pub dest: Option<String>,

    /// Extract even if the destination directory is not empty.
    #[arg(short = 'f', long, action = clap::ArgAction::SetTrue)]
    pub force: bool,

    /// Do not keep the tarball or update the ref index in the cache.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_cache: bool,

    /// Never access the network; use cached tarballs only.
    #[arg(short = 'o', long, action = clap::ArgAction::SetTrue)]
    pub offline: bool,

    /// How to fetch the repository.
    #[arg(short = 'm', long, value_enum, default_value_t = Mode::Auto)]
    pub mode: Mode,

    /// Treat the first path segment after the repository as a nested group (e.g. GitLab subgroups).
    #[arg(short = 's', long, action = clap::ArgAction::SetTrue)]
    pub subgroup: bool,

    /// Extract only this path of the repository. Overrides a sub-path in SRC.
    #[arg(long, value_name = "PATH")]
    pub sub_directory: Option<String>,

    /// Proxy for tarball downloads. Defaults to the https_proxy environment variable.
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Cache root. Defaults to $GITSNAP_CACHE_DIR or the platform cache directory.
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<String>,

    /// Show debug output.
    #[arg(short = 'v', long, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["gitsnap", "user/repo"]);
        assert_eq!(cli.src, "user/repo");
        assert_eq!(cli.dest, None);
        assert_eq!(cli.mode, Mode::Auto);
        assert!(!cli.force && !cli.no_cache && !cli.offline && !cli.subgroup);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["gitsnap", "user/repo", "out", "-f", "-o", "-s", "-m", "tar"]);
        assert_eq!(cli.dest.as_deref(), Some("out"));
        assert!(cli.force && cli.offline && cli.subgroup);
        assert_eq!(cli.mode, Mode::Tar);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["gitsnap", "user/repo", "--mode", "zip"]).is_err());
    }
}
