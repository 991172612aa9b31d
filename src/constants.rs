// src/constants.rs

/// Ref used when the source specifier names no `#ref`; resolves to the remote's default branch.
pub const DEFAULT_REF: &str = "HEAD";

/// Host assumed when the source specifier carries no host prefix.
pub const DEFAULT_SITE: &str = "github";

/// Size of a tar header (and of the blocks entry data is padded to).
pub const TAR_BLOCK_SIZE: usize = 512;

/// Name of the metadata entry hosting providers put in front of their tarballs.
pub const PAX_GLOBAL_HEADER_NAME: &str = "pax_global_header";

/// Minimum length of a ref before it is tried as an abbreviated commit hash.
pub const MIN_HASH_PREFIX_LEN: usize = 8;

/// Cache index file mapping refs to commit hashes.
pub const CACHE_MAP_FILE: &str = "map.json";

/// Cache index file mapping refs to their last access time.
pub const CACHE_ACCESS_FILE: &str = "access.json";

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "GITSNAP_CACHE_DIR";
