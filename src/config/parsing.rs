// src/config/parsing.rs

use crate::errors::{ConfigError, Result};
use std::env;
use url::Url;

/// Environment variables consulted for a proxy when none is configured.
const PROXY_ENV_VARS: [&str; 2] = ["https_proxy", "HTTPS_PROXY"];

/// Validates an explicitly configured proxy URL.
pub(super) fn parse_proxy(proxy: Option<String>) -> Result<Option<String>> {
    let Some(raw) = proxy else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
        option: "--proxy".to_string(),
        reason: format!("'{}' is not a valid URL: {}", trimmed, e),
    })?;
    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidValue {
            option: "--proxy".to_string(),
            reason: format!("'{}' has no host", trimmed),
        }
        .into());
    }
    Ok(Some(trimmed.to_string()))
}

/// The first non-empty proxy from the environment, if any.
pub(super) fn proxy_from_env() -> Option<String> {
    PROXY_ENV_VARS
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
