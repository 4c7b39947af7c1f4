//! CATYPE Core - Catalog Content-Type Types
//!
//! Value types, error taxonomy, configuration and collaborator traits shared
//! by the resolver and cache crates. This crate contains no resolution logic.

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod identity;
pub mod resolved;
pub mod traits;

pub use cache::{CacheClock, CacheStats, CacheStore, EvictionPolicy, Expiration, SystemClock};
pub use config::CacheConfig;
pub use descriptor::{CatalogBaseType, ContentFamily, ContentTypeDescriptor};
pub use error::{
    CacheError, CatypeError, CatypeResult, ClassificationError, ConfigError, LookupError,
    MappingError, RegistryError, SnapshotError,
};
pub use identity::{ContentKind, ContentReference};
pub use resolved::ResolvedContentType;
pub use traits::{
    links_for_codes, ContentTypeRegistry, ContentTypeResolver, MetaClassLookup, MetaClassNames,
    MetaClassRequest, MetaClassRow, ReferenceConverter,
};
