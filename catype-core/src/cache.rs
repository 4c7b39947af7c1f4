//! Keyed cache store contract.
//!
//! This module defines the trait a cache store must implement, the eviction
//! policy attached to every entry, and the clock stores use to evaluate
//! expiration. Storage itself lives outside this crate.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatypeResult;

/// How an entry's lifetime is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiration {
    /// Expires once the window elapses without a read; every read re-arms it.
    Sliding(Duration),
    /// Expires once the window elapses after insertion.
    Absolute(Duration),
    /// Lives until invalidated.
    Never,
}

/// Eviction policy stored alongside a cached value.
///
/// `dependency_keys` name the invalidation signals the entry listens to.
/// Invalidating any one of them removes the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionPolicy {
    pub expiration: Expiration,
    pub dependency_keys: BTreeSet<String>,
}

impl EvictionPolicy {
    /// Expire after `window` without a read.
    pub fn sliding(window: Duration) -> Self {
        Self {
            expiration: Expiration::Sliding(window),
            dependency_keys: BTreeSet::new(),
        }
    }

    /// Expire `window` after insertion, regardless of reads.
    pub fn absolute(window: Duration) -> Self {
        Self {
            expiration: Expiration::Absolute(window),
            dependency_keys: BTreeSet::new(),
        }
    }

    /// Keep until invalidated.
    pub fn never() -> Self {
        Self {
            expiration: Expiration::Never,
            dependency_keys: BTreeSet::new(),
        }
    }

    /// Add a dependency key.
    pub fn with_dependency(mut self, key: impl Into<String>) -> Self {
        self.dependency_keys.insert(key.into());
        self
    }

    /// Whether invalidating `key` evicts this entry.
    pub fn depends_on(&self, key: &str) -> bool {
        self.dependency_keys.contains(key)
    }

    /// Whether an entry inserted at `inserted_at` and last read at
    /// `last_access` has expired at `now`.
    pub fn is_expired(
        &self,
        inserted_at: DateTime<Utc>,
        last_access: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        match self.expiration {
            Expiration::Sliding(window) => elapsed(last_access, now) >= window,
            Expiration::Absolute(window) => elapsed(inserted_at, now) >= window,
            Expiration::Never => false,
        }
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(since)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Keyed cache store.
///
/// Implementations must be thread-safe. The resolver only ever reads and
/// inserts; `invalidate` exists for the subsystems that own the data.
pub trait CacheStore<V>: Send + Sync {
    /// Get a live value, or `None` if absent or expired.
    fn get(&self, key: &str) -> CatypeResult<Option<V>>;

    /// Insert or overwrite a value.
    fn insert(&self, key: &str, value: V, policy: EvictionPolicy) -> CatypeResult<()>;

    /// Remove every entry depending on `dependency_key`. Returns how many were removed.
    fn invalidate(&self, dependency_key: &str) -> CatypeResult<u64>;

    /// Get cache statistics.
    fn stats(&self) -> CatypeResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses, expired entries included.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of entries dropped because their window elapsed.
    pub expirations: u64,
    /// Number of entries removed through dependency invalidation.
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Time source for expiration checks.
///
/// Injected so tests can move time forward without sleeping.
pub trait CacheClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl CacheClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
