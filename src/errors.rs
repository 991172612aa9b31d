//! Defines the error types surfaced by `gitsnap`.
//!
//! Every failure a caller can act on carries a machine-readable [`ErrorCode`]
//! (`BAD_SRC`, `CACHE_MISS`, ...) next to a human-readable message, so the CLI
//! and library users can branch on the kind of failure without string matching.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving, downloading or extracting a repository snapshot.
#[derive(Error, Debug)]
pub enum Error {
    // --- Input errors ---
    /// The source specifier does not match the accepted grammar.
    #[error("could not parse repository source '{src}'")]
    BadSrc {
        /// The offending specifier.
        src: String,
    },

    /// A line of the remote ref listing could not be parsed.
    #[error("could not parse remote ref line '{line}'")]
    BadRef {
        /// The offending line.
        line: String,
    },

    // --- Archive safety ---
    /// An archive entry would be written outside of the destination directory.
    #[error("refusing to extract '{path}': it resolves outside the destination directory")]
    BadTarPath {
        /// The mapped output path of the offending entry.
        path: String,
    },

    // --- Resolution errors ---
    /// The requested ref could not be turned into a commit hash.
    #[error("could not find commit hash for '{reference}' in {repo}")]
    MissingRef {
        /// The requested ref.
        reference: String,
        /// The repository URL.
        repo: String,
    },

    /// Offline mode was requested but the cache cannot serve the request.
    #[error("offline mode: no cached tarball for '{reference}' (expected {})", .path.display())]
    CacheMiss {
        /// The requested ref.
        reference: String,
        /// Where the tarball (or index entry) was expected.
        path: PathBuf,
    },

    // --- Transport errors ---
    /// Listing the remote refs failed.
    #[error("could not fetch remote refs for {url}")]
    CouldNotFetch {
        /// The repository URL.
        url: String,
        /// The underlying process or network error.
        #[source]
        source: anyhow::Error,
    },

    /// Downloading the tarball failed.
    #[error("could not download {url}")]
    CouldNotDownload {
        /// The archive URL.
        url: String,
        /// The underlying network or I/O error.
        #[source]
        source: anyhow::Error,
    },

    // --- Outcome errors ---
    /// Nothing was extracted.
    #[error("{}", no_files_message(.sub_path.as_deref()))]
    NoFiles {
        /// The requested sub-path, if any.
        sub_path: Option<String>,
    },

    /// The destination exists and is not empty.
    #[error("destination directory '{}' is not empty, use --force to continue", .dest.display())]
    DestNotEmpty {
        /// The destination directory.
        dest: PathBuf,
    },

    // --- Ambient errors ---
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error occurring during file or directory access.
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        /// The path that caused the I/O error.
        path: String,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    /// Running the external `git` binary failed (git mode).
    #[error("git operation failed")]
    Git {
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn no_files_message(sub_path: Option<&str>) -> String {
    match sub_path {
        Some(sub) => format!(
            "no files to extract: nothing matched '{}', make sure the sub-path is spelled correctly",
            sub
        ),
        None => "no files to extract: the repository appears to be empty".to_string(),
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    BadSrc,
    BadRef,
    BadTarPath,
    MissingRef,
    CacheMiss,
    CouldNotFetch,
    CouldNotDownload,
    NoFiles,
    DestNotEmpty,
    Config,
    Io,
    Git,
    Other,
}

impl ErrorCode {
    /// The code as printed by the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadSrc => "BAD_SRC",
            ErrorCode::BadRef => "BAD_REF",
            ErrorCode::BadTarPath => "BAD_TAR_PATH",
            ErrorCode::MissingRef => "MISSING_REF",
            ErrorCode::CacheMiss => "CACHE_MISS",
            ErrorCode::CouldNotFetch => "COULD_NOT_FETCH",
            ErrorCode::CouldNotDownload => "COULD_NOT_DOWNLOAD",
            ErrorCode::NoFiles => "NO_FILES",
            ErrorCode::DestNotEmpty => "DEST_NOT_EMPTY",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Io => "IO",
            ErrorCode::Git => "GIT",
            ErrorCode::Other => "OTHER",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Returns the machine-readable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::BadSrc { .. } => ErrorCode::BadSrc,
            Error::BadRef { .. } => ErrorCode::BadRef,
            Error::BadTarPath { .. } => ErrorCode::BadTarPath,
            Error::MissingRef { .. } => ErrorCode::MissingRef,
            Error::CacheMiss { .. } => ErrorCode::CacheMiss,
            Error::CouldNotFetch { .. } => ErrorCode::CouldNotFetch,
            Error::CouldNotDownload { .. } => ErrorCode::CouldNotDownload,
            Error::NoFiles { .. } => ErrorCode::NoFiles,
            Error::DestNotEmpty { .. } => ErrorCode::DestNotEmpty,
            Error::Config(_) => ErrorCode::Config,
            Error::Io { .. } => ErrorCode::Io,
            Error::Git { .. } => ErrorCode::Git,
            Error::Other(_) => ErrorCode::Other,
        }
    }
}

/// Errors raised while validating configuration options.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Two options cannot be used together.
    #[error("cannot use {option1} together with {option2}")]
    Conflict { option1: String, option2: String },

    /// An option has an unusable value.
    #[error("invalid value for {option}: {reason}")]
    InvalidValue { option: String, reason: String },

    /// No cache directory could be determined for this platform.
    #[error("could not determine a cache directory, set GITSNAP_CACHE_DIR or use --cache-dir")]
    NoCacheDir,
}

/// A specialized `Result` type for `gitsnap` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Helper function to create an `Error::Io` with path context.
///
/// # Arguments
/// * `source` - The original `std::io::Error`.
/// * `path` - The path associated with the error, convertible to `AsRef<std::path::Path>`.
pub fn io_error_with_path<P: AsRef<std::path::Path>>(source: std::io::Error, path: P) -> Error {
    Error::Io {
        path: path.as_ref().display().to_string(),
        source,
    }
}
