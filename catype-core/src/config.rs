//! Configuration types
//!
//! Cache settings are loaded from environment variables with defaults that
//! match the reference deployment: a ten minute sliding window under the
//! `catalog:content-type:` key prefix.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CatypeResult, ConfigError};

/// Marker appended to the key prefix to form the shared clear-all key.
pub const WILDCARD_MARKER: &str = "*";

/// Default key prefix for cached content types.
pub const DEFAULT_KEY_PREFIX: &str = "catalog:content-type:";

/// Default sliding expiration window.
pub const DEFAULT_SLIDING_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Configuration for the content-type cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Prefix for every cache key this resolver writes.
    pub key_prefix: String,
    /// Sliding expiration window, re-armed on every read.
    pub sliding_window: Duration,
    /// Whether the structural kind is part of the key.
    /// Disable only when object ids are unique across nodes and entries.
    pub include_kind_in_key: bool,
    /// When false the cached resolver delegates without touching the store.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            sliding_window: DEFAULT_SLIDING_WINDOW,
            include_kind_in_key: true,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the sliding expiration window.
    pub fn with_sliding_window(mut self, window: Duration) -> Self {
        self.sliding_window = window;
        self
    }

    /// Include or omit the structural kind in cache keys.
    pub fn with_kind_in_key(mut self, include: bool) -> Self {
        self.include_kind_in_key = include;
        self
    }

    /// Enable or disable caching.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Create a CacheConfig from environment variables.
    ///
    /// Environment variables:
    /// - `CATYPE_CACHE_PREFIX`: Key prefix (default: `catalog:content-type:`)
    /// - `CATYPE_CACHE_SLIDING_SECS`: Sliding window in seconds (default: 600)
    /// - `CATYPE_CACHE_KIND_IN_KEY`: "true" or "false" (default: true)
    /// - `CATYPE_CACHE_ENABLED`: "true" or "false" (default: true)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let key_prefix = lookup("CATYPE_CACHE_PREFIX")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.key_prefix);

        let sliding_window = lookup("CATYPE_CACHE_SLIDING_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.sliding_window);

        let include_kind_in_key = lookup("CATYPE_CACHE_KIND_IN_KEY")
            .and_then(|s| parse_bool(&s))
            .unwrap_or(defaults.include_kind_in_key);

        let enabled = lookup("CATYPE_CACHE_ENABLED")
            .and_then(|s| parse_bool(&s))
            .unwrap_or(defaults.enabled);

        Self {
            key_prefix,
            sliding_window,
            include_kind_in_key,
            enabled,
        }
    }

    /// The shared clear-all dependency key for this prefix.
    pub fn master_key(&self) -> String {
        format!("{}{}", self.key_prefix, WILDCARD_MARKER)
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - key_prefix is not blank
    /// - key_prefix does not end in the wildcard marker
    /// - sliding_window is non-zero
    pub fn validate(&self) -> CatypeResult<()> {
        if self.key_prefix.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "key_prefix".to_string(),
            }
            .into());
        }

        if self.key_prefix.ends_with(WILDCARD_MARKER) {
            return Err(ConfigError::InvalidValue {
                field: "key_prefix".to_string(),
                value: self.key_prefix.clone(),
                reason: "prefix must not end with the wildcard marker".to_string(),
            }
            .into());
        }

        if self.sliding_window.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "sliding_window".to_string(),
                value: format!("{:?}", self.sliding_window),
                reason: "must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
