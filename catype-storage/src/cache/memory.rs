//! In-memory cache store with sliding expiration and dependency invalidation.
//!
//! Entries live in a [`DashMap`]. Expiration is evaluated lazily on read
//! against an injected [`CacheClock`]; [`InMemoryCacheStore::purge_expired`]
//! sweeps the rest. Statistics are tracked with atomic counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use catype_core::{CacheClock, CacheStats, CacheStore, CatypeResult, EvictionPolicy, SystemClock};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    policy: EvictionPolicy,
    inserted_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
}

impl<V> Slot<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.policy.is_expired(self.inserted_at, self.last_access, now)
    }
}

/// Thread-safe in-memory [`CacheStore`].
pub struct InMemoryCacheStore<V> {
    entries: DashMap<String, Slot<V>>,
    clock: Arc<dyn CacheClock>,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    invalidations: AtomicU64,
}

impl<V> InMemoryCacheStore<V>
where
    V: Clone + Send + Sync,
{
    /// Create a store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a store on a custom clock.
    pub fn with_clock(clock: Arc<dyn CacheClock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Number of stored entries, expired ones not yet swept included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no slots.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a slot exists for `key`, expired or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Dependency keys of a stored entry.
    pub fn policy_of(&self, key: &str) -> Option<EvictionPolicy> {
        self.entries.get(key).map(|slot| slot.policy.clone())
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> u64 {
        let now = self.clock.now();
        let mut removed = 0u64;
        self.entries.retain(|_, slot| {
            if slot.is_expired(now) {
                removed += 1;
                false
            } else {
                true
            }
        });
        self.expirations.fetch_add(removed, Ordering::Relaxed);
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<V> Default for InMemoryCacheStore<V>
where
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheStore<V> for InMemoryCacheStore<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> CatypeResult<Option<V>> {
        let now = self.clock.now();

        let expired = match self.entries.get_mut(key) {
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
            Some(mut slot) => {
                if slot.is_expired(now) {
                    true
                } else {
                    slot.last_access = now;
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Some(slot.value.clone()));
                }
            }
        };

        // The shard guard is released here; another writer may have replaced
        // the slot, so only remove it if it is still expired.
        if expired && self.entries.remove_if(key, |_, slot| slot.is_expired(now)).is_some() {
            self.expirations.fetch_add(1, Ordering::Relaxed);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    fn insert(&self, key: &str, value: V, policy: EvictionPolicy) -> CatypeResult<()> {
        let now = self.clock.now();
        self.entries.insert(
            key.to_string(),
            Slot {
                value,
                policy,
                inserted_at: now,
                last_access: now,
            },
        );
        Ok(())
    }

    fn invalidate(&self, dependency_key: &str) -> CatypeResult<u64> {
        let mut removed = 0u64;
        self.entries.retain(|_, slot| {
            if slot.policy.depends_on(dependency_key) {
                removed += 1;
                false
            } else {
                true
            }
        });
        self.invalidations.fetch_add(removed, Ordering::Relaxed);
        tracing::debug!(dependency_key, removed, "Invalidated cache entries");
        Ok(removed)
    }

    fn stats(&self) -> CatypeResult<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
            expirations: self.expirations.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catype_test_utils::ManualClock;
    use std::time::Duration;

    fn store() -> (Arc<ManualClock>, InMemoryCacheStore<String>) {
        let clock = ManualClock::new();
        let store = InMemoryCacheStore::with_clock(clock.clone());
        (clock, store)
    }

    fn sliding() -> EvictionPolicy {
        EvictionPolicy::sliding(Duration::from_secs(600))
    }

    #[test]
    fn test_get_missing_is_miss() {
        let (_, store) = store();
        assert_eq!(store.get("nope").unwrap(), None);
        let stats = store.stats().unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_insert_then_get() {
        let (_, store) = store();
        store.insert("k", "Product".to_string(), sliding()).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("Product".to_string()));
        assert_eq!(store.stats().unwrap().hits, 1);
    }

    #[test]
    fn test_insert_overwrites() {
        let (_, store) = store();
        store.insert("k", "Product".to_string(), sliding()).unwrap();
        store.insert("k", "Variation".to_string(), sliding()).unwrap();
        assert_eq!(store.get("k").unwrap(), Some("Variation".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sliding_window_is_rearmed_by_reads() {
        let (clock, store) = store();
        store.insert("k", "Product".to_string(), sliding()).unwrap();

        clock.advance(Duration::from_secs(500));
        assert!(store.get("k").unwrap().is_some());

        clock.advance(Duration::from_secs(500));
        assert!(store.get("k").unwrap().is_some(), "read re-armed the window");

        clock.advance(Duration::from_secs(600));
        assert!(store.get("k").unwrap().is_none());
        assert!(!store.contains_key("k"));
        assert_eq!(store.stats().unwrap().expirations, 1);
    }

    #[test]
    fn test_absolute_window_ignores_reads() {
        let (clock, store) = store();
        let policy = EvictionPolicy::absolute(Duration::from_secs(60));
        store.insert("k", "Product".to_string(), policy).unwrap();

        clock.advance(Duration::from_secs(30));
        assert!(store.get("k").unwrap().is_some());
        clock.advance(Duration::from_secs(30));
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_invalidate_by_item_dependency() {
        let (_, store) = store();
        let policy_a = sliding()
            .with_dependency("content:common:1")
            .with_dependency("p:*");
        let policy_b = sliding()
            .with_dependency("content:common:2")
            .with_dependency("p:*");
        store.insert("a", "A".to_string(), policy_a).unwrap();
        store.insert("b", "B".to_string(), policy_b).unwrap();

        assert_eq!(store.invalidate("content:common:1").unwrap(), 1);
        assert!(store.get("a").unwrap().is_none());
        assert!(store.get("b").unwrap().is_some());
    }

    #[test]
    fn test_invalidate_master_key_clears_all_dependents() {
        let (_, store) = store();
        store.insert("a", "A".to_string(), sliding().with_dependency("p:*")).unwrap();
        store.insert("b", "B".to_string(), sliding().with_dependency("p:*")).unwrap();
        store.insert("c", "C".to_string(), sliding()).unwrap();

        assert_eq!(store.invalidate("p:*").unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().unwrap().invalidations, 2);
        assert_eq!(store.invalidate("p:*").unwrap(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let (clock, store) = store();
        let short = EvictionPolicy::absolute(Duration::from_secs(1));
        store.insert("short", "S".to_string(), short).unwrap();
        store.insert("long", "L".to_string(), EvictionPolicy::never()).unwrap();

        clock.advance(Duration::from_secs(5));
        assert_eq!(store.purge_expired(), 1);
        assert!(store.contains_key("long"));
        assert!(!store.contains_key("short"));
    }

    #[test]
    fn test_policy_of() {
        let (_, store) = store();
        store.insert("k", "V".to_string(), sliding().with_dependency("d")).unwrap();
        assert!(store.policy_of("k").unwrap().depends_on("d"));
        assert!(store.policy_of("missing").is_none());
    }

    #[test]
    fn test_concurrent_access() {
        let store = Arc::new(InMemoryCacheStore::<u64>::new());
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100u64 {
                        let key = format!("k{}", i % 10);
                        let policy = EvictionPolicy::never().with_dependency("all");
                        store.insert(&key, t * 1000 + i, policy).unwrap();
                        let _ = store.get(&key).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 10);
        assert_eq!(store.invalidate("all").unwrap(), 10);
        assert!(store.is_empty());
    }
}
