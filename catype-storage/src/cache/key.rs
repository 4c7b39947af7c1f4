//! Cache key scheme.
//!
//! Entry keys are `{prefix}{kind}:{object_id}` by default. With the kind
//! left out they become `{prefix}{object_id}`, which is only safe when node
//! and entry ids never overlap.

use catype_core::{CacheConfig, ContentKind, ContentReference};

/// Prefix of the per-item dependency key other subsystems invalidate.
pub const COMMON_KEY_PREFIX: &str = "content:common:";

/// Builds the keys the cached resolver reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeyScheme {
    prefix: String,
    include_kind: bool,
}

impl CacheKeyScheme {
    /// Create a key scheme.
    pub fn new(prefix: impl Into<String>, include_kind: bool) -> Self {
        Self {
            prefix: prefix.into(),
            include_kind,
        }
    }

    /// Key scheme for a cache configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.key_prefix.clone(), config.include_kind_in_key)
    }

    /// Get the key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key under which the content type of one object is stored.
    pub fn entry_key(&self, kind: ContentKind, object_id: i64) -> String {
        if self.include_kind {
            format!("{}{}:{}", self.prefix, kind, object_id)
        } else {
            format!("{}{}", self.prefix, object_id)
        }
    }

    /// The shared clear-all dependency key.
    pub fn master_key(&self) -> String {
        format!("{}{}", self.prefix, catype_core::config::WILDCARD_MARKER)
    }

    /// Per-item dependency key for a content reference.
    pub fn dependency_key(&self, content_link: &ContentReference) -> String {
        format!("{}{}", COMMON_KEY_PREFIX, content_link.link_id())
    }
}

impl Default for CacheKeyScheme {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
