// src/config/builder.rs

use super::{
    builder_logic::validate_builder_options,
    parsing::{parse_proxy, proxy_from_env},
    path_resolve::{determine_cache_dir, resolve_dest},
    Config, Mode,
};
use crate::cli::Cli;
use crate::errors::{ConfigError, Result};
use crate::source;

/// A builder for creating a `Config` programmatically.
///
/// # Examples
///
/// ```
/// use gitsnap::config::{ConfigBuilder, Mode};
///
/// let config = ConfigBuilder::new()
///     .source("user/repo#v1.0")
///     .dest("/tmp/my-project")
///     .cache_dir("/tmp/gitsnap-cache")
///     .mode(Mode::Tar)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.repository.reference, "v1.0");
/// assert!(config.cache);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ConfigBuilder {
    pub(super) source: Option<String>,
    pub(super) dest: Option<String>,
    pub(super) force: Option<bool>,
    pub(super) no_cache: Option<bool>,
    pub(super) offline: Option<bool>,
    pub(super) mode: Option<Mode>,
    pub(super) subgroup: Option<bool>,
    pub(super) sub_directory: Option<String>,
    pub(super) proxy: Option<String>,
    pub(super) cache_dir: Option<String>,
}

impl ConfigBuilder {
    /// Creates a new `ConfigBuilder` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `ConfigBuilder` from the command line arguments.
    pub fn from_cli(cli: Cli) -> Self {
        Self {
            source: Some(cli.src),
            dest: cli.dest,
            force: Some(cli.force),
            no_cache: Some(cli.no_cache),
            offline: Some(cli.offline),
            mode: Some(cli.mode),
            subgroup: Some(cli.subgroup),
            sub_directory: cli.sub_directory,
            proxy: cli.proxy,
            cache_dir: cli.cache_dir,
        }
    }

    /// Sets the source specifier, e.g. `github:user/repo/sub/dir#ref`.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the destination directory. Defaults to the repository name.
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// Continue even if the destination is not empty.
    pub fn force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    /// Disables the tarball cache for this run.
    pub fn no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = Some(no_cache);
        self
    }

    /// Serve from the cache only.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = Some(offline);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Treat the first path segment after the repository as part of its name.
    pub fn subgroup(mut self, subgroup: bool) -> Self {
        self.subgroup = Some(subgroup);
        self
    }

    /// Sets the sub-directory to extract, overriding the one in the source.
    pub fn sub_directory(mut self, sub_directory: impl Into<String>) -> Self {
        self.sub_directory = Some(sub_directory.into());
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Sets the cache root explicitly.
    pub fn cache_dir(mut self, cache_dir: impl Into<String>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Validates the options, parses the source and resolves all paths.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::BadSrc`] for an unparsable source and
    /// [`crate::errors::Error::Config`] for invalid option combinations.
    pub fn build(self) -> Result<Config> {
        validate_builder_options(&self)?;

        let src = self.source.ok_or_else(|| ConfigError::InvalidValue {
            option: "SRC".to_string(),
            reason: "a repository source is required".to_string(),
        })?;
        let subgroup = self.subgroup.unwrap_or(false);
        let repository = source::parse(&src, subgroup, self.sub_directory.as_deref())?;
        log::debug!("Parsed repository: {:?}", repository);

        let dest = resolve_dest(self.dest.as_deref(), &repository)?;
        let cache_dir = determine_cache_dir(self.cache_dir.as_deref())?;
        let proxy = match parse_proxy(self.proxy)? {
            Some(proxy) => Some(proxy),
            None => proxy_from_env(),
        };

        Ok(Config {
            source: src,
            repository,
            dest,
            force: self.force.unwrap_or(false),
            cache: !self.no_cache.unwrap_or(false),
            offline: self.offline.unwrap_or(false),
            mode: self.mode.unwrap_or_default(),
            proxy,
            cache_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Error, ErrorCode};
    use clap::Parser;
    use std::path::PathBuf;

    fn base() -> ConfigBuilder {
        ConfigBuilder::new()
            .dest("/tmp/gitsnap-out")
            .cache_dir("/tmp/gitsnap-cache")
    }

    #[test]
    fn test_basic_config_creation() -> anyhow::Result<()> {
        let config = base().source("user/repo").build()?;
        assert_eq!(config.repository.site, "github");
        assert_eq!(config.dest, PathBuf::from("/tmp/gitsnap-out"));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/gitsnap-cache"));
        assert!(config.cache);
        assert!(!config.offline);
        assert!(!config.force);
        assert_eq!(config.mode, Mode::Auto);
        Ok(())
    }

    #[test]
    fn test_from_cli() -> anyhow::Result<()> {
        let cli = Cli::parse_from([
            "gitsnap",
            "gitlab:user/repo#dev",
            "/tmp/gitsnap-out",
            "--force",
            "--offline",
            "--mode",
            "git",
            "--cache-dir",
            "/tmp/gitsnap-cache",
        ]);
        let config = ConfigBuilder::from_cli(cli).build()?;
        assert!(config.force);
        assert!(config.offline);
        assert_eq!(config.mode, Mode::Git);
        assert_eq!(config.repository.reference, "dev");
        assert_eq!(config.repository.url, "https://gitlab.com/user/repo");
        Ok(())
    }

    #[test]
    fn test_bad_source_is_reported_as_bad_src() {
        let err = base().source("not a repo").build().unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadSrc);
    }

    #[test]
    fn test_parent_segments_in_source_sub_path_are_rejected() {
        let err = base()
            .source("user/repo/../../secret.txt")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadSrc);
    }

    #[test]
    fn test_missing_source_is_a_config_error() {
        let err = base().build().unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_offline_without_cache_conflicts() {
        let err = base()
            .source("user/repo")
            .offline(true)
            .no_cache(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Conflict { .. })));
    }

    #[test]
    fn test_explicit_sub_directory_overrides_parsed_one() -> anyhow::Result<()> {
        let config = base()
            .source("user/repo/docs")
            .sub_directory("./src/")
            .build()?;
        assert_eq!(config.repository.sub_path.as_deref(), Some("src"));
        Ok(())
    }

    #[test]
    fn test_explicit_proxy_is_kept() -> anyhow::Result<()> {
        let config = base()
            .source("user/repo")
            .proxy("http://proxy.local:3128")
            .build()?;
        assert_eq!(config.proxy.as_deref(), Some("http://proxy.local:3128"));
        Ok(())
    }

    #[test]
    fn test_invalid_proxy_is_rejected() {
        let err = base()
            .source("user/repo")
            .proxy("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { .. })
        ));
    }
}
