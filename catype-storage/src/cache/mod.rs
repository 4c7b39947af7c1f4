//! Read-through cache for resolved content types.
//!
//! The [`CachedContentTypeResolver`] wraps any [`ContentTypeResolver`] and a
//! [`CacheStore`]. Each batch is split into hits and misses; only misses are
//! forwarded, and every pair the inner resolver returns is stored under a
//! sliding window with two dependency keys:
//!
//! - a per-item key (`content:common:{link_id}`) shared with the rest of the
//!   content subsystem, so one item can be evicted from outside
//! - the clear-all key (`{prefix}*`), for schema changes in the backing store
//!
//! Unresolvable references are never cached, so they repeat the full miss
//! path on every call.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(InMemoryCacheStore::new());
//! let cached = CachedContentTypeResolver::new(resolver, converter, store, CacheConfig::from_env())?;
//!
//! let resolved = cached.resolve_content_types(&links)?;
//!
//! // After a meta class is renamed:
//! cached.invalidate_all()?;
//! ```
//!
//! [`ContentTypeResolver`]: catype_core::ContentTypeResolver
//! [`CacheStore`]: catype_core::CacheStore

pub mod key;
pub mod memory;
pub mod read_through;

pub use key::{CacheKeyScheme, COMMON_KEY_PREFIX};
pub use memory::InMemoryCacheStore;
pub use read_through::CachedContentTypeResolver;
