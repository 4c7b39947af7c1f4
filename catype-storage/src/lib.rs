//! CATYPE Storage - Content-Type Resolution and Caching
//!
//! Resolves batches of catalog content references into their declared
//! content types. The [`CatalogContentTypeResolver`] partitions a batch by
//! structural kind and issues one bulk metadata lookup for nodes and entries;
//! the [`CachedContentTypeResolver`] sits in front of any resolver and only
//! forwards cache misses.

pub mod cache;
pub mod resolver;
pub mod snapshot;
pub mod type_index;

pub use cache::{CacheKeyScheme, CachedContentTypeResolver, InMemoryCacheStore};
pub use resolver::CatalogContentTypeResolver;
pub use snapshot::{SnapshotCatalog, SnapshotDocument, SnapshotObject};
pub use type_index::TypeNameIndex;

pub use catype_core::{
    CacheClock, CacheConfig, CacheStats, CacheStore, CatypeError, CatypeResult, ContentKind,
    ContentReference, ContentTypeDescriptor, ContentTypeResolver, EvictionPolicy,
    ResolvedContentType, SystemClock,
};
