// src/config/builder_logic.rs

use super::ConfigBuilder;
use crate::errors::{ConfigError, Result};

/// Validates combinations of options on the `ConfigBuilder`.
pub(super) fn validate_builder_options(builder: &ConfigBuilder) -> Result<()> {
    // Offline runs can only be served from the cache.
    if builder.offline.unwrap_or(false) && builder.no_cache.unwrap_or(false) {
        return Err(ConfigError::Conflict {
            option1: "--offline".to_string(),
            option2: "--no-cache".to_string(),
        }
        .into());
    }
    if let Some(sub) = &builder.sub_directory {
        if sub.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(ConfigError::InvalidValue {
                option: "--sub-directory".to_string(),
                reason: "must not contain '..' segments".to_string(),
            }
            .into());
        }
    }
    if builder.cache_dir.as_deref() == Some("") {
        return Err(ConfigError::InvalidValue {
            option: "--cache-dir".to_string(),
            reason: "must not be empty".to_string(),
        }
        .into());
    }
    Ok(())
}
