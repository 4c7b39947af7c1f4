//! CATYPE Test Utilities
//!
//! Centralized test infrastructure for the CATYPE workspace:
//! - Descriptor fixtures for a small fashion catalog
//! - Stub collaborators (reference converter, counting lookup, failing cache)
//! - A manually advanced clock for expiration tests
//! - Proptest generators for references and rows

pub use catype_core::{
    CacheClock, CacheConfig, CacheError, CacheStats, CacheStore, CatalogBaseType, CatypeError,
    CatypeResult, ContentFamily, ContentKind, ContentReference, ContentTypeDescriptor,
    ContentTypeRegistry, EvictionPolicy, LookupError, MetaClassLookup, MetaClassNames,
    MetaClassRequest, MetaClassRow, ReferenceConverter, ResolvedContentType,
};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

// ============================================================================
// LOGGING
// ============================================================================

/// Initialize test logging (safe to call from every test).
pub fn init_test_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("catype_storage=debug")),
        )
        .with_test_writer()
        .try_init();
}

// ============================================================================
// DESCRIPTOR FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;

    /// The well-known catalog content type.
    pub fn catalog_type() -> ContentTypeDescriptor {
        ContentTypeDescriptor::new(
            1,
            "CatalogContent",
            ContentFamily::CatalogContent(CatalogBaseType::Catalog),
        )
    }

    /// Node type stored under the "Category" meta class.
    pub fn category_type() -> ContentTypeDescriptor {
        ContentTypeDescriptor::new(
            2,
            "FashionNode",
            ContentFamily::CatalogContent(CatalogBaseType::Node),
        )
        .with_meta_class_name("Category")
    }

    /// Product type stored under the "Product" meta class.
    pub fn product_type() -> ContentTypeDescriptor {
        ContentTypeDescriptor::new(
            3,
            "FashionProduct",
            ContentFamily::CatalogContent(CatalogBaseType::Product),
        )
        .with_meta_class_name("Product")
    }

    /// Variation type without an annotation; the backing store uses its model name.
    pub fn variant_type() -> ContentTypeDescriptor {
        ContentTypeDescriptor::new(
            4,
            "FashionVariant",
            ContentFamily::CatalogContent(CatalogBaseType::Variation),
        )
    }

    /// A CMS page type that must never be mapped.
    pub fn page_type() -> ContentTypeDescriptor {
        ContentTypeDescriptor::new(5, "Product", ContentFamily::Other)
    }

    /// Every descriptor the fixture registry declares.
    pub fn all_descriptors() -> Vec<ContentTypeDescriptor> {
        vec![
            catalog_type(),
            category_type(),
            product_type(),
            variant_type(),
            page_type(),
        ]
    }
}

/// Registry over a fixed descriptor list.
#[derive(Debug, Clone)]
pub struct FixedRegistry {
    descriptors: Vec<ContentTypeDescriptor>,
    catalog: Option<ContentTypeDescriptor>,
}

impl FixedRegistry {
    pub fn new(descriptors: Vec<ContentTypeDescriptor>, catalog: ContentTypeDescriptor) -> Self {
        Self {
            descriptors,
            catalog: Some(catalog),
        }
    }

    /// A registry with no catalog type registered.
    pub fn without_catalog(descriptors: Vec<ContentTypeDescriptor>) -> Self {
        Self {
            descriptors,
            catalog: None,
        }
    }
}

impl Default for FixedRegistry {
    fn default() -> Self {
        Self::new(fixtures::all_descriptors(), fixtures::catalog_type())
    }
}

impl ContentTypeRegistry for FixedRegistry {
    fn list_descriptors(&self) -> CatypeResult<Vec<ContentTypeDescriptor>> {
        Ok(self.descriptors.clone())
    }

    fn load_catalog_descriptor(&self) -> CatypeResult<ContentTypeDescriptor> {
        self.catalog
            .clone()
            .ok_or_else(|| catype_core::RegistryError::CatalogTypeMissing.into())
    }
}

// ============================================================================
// REFERENCE CONVERTER
// ============================================================================

/// Reference converter using the encoding `link_id = object_id * 4 + tag`.
///
/// Tags: 1 = catalog, 2 = node, 3 = entry. Tag 0 is non-catalog content.
#[derive(Debug, Default)]
pub struct StubReferenceConverter {
    codes: Mutex<HashMap<String, ContentReference>>,
}

impl StubReferenceConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a code for an object.
    pub fn with_code(self, code: impl Into<String>, object_id: i64, kind: ContentKind) -> Self {
        let link = link(object_id, kind);
        if let Ok(mut codes) = self.codes.lock() {
            codes.insert(code.into(), link);
        }
        self
    }
}

fn kind_tag(kind: ContentKind) -> i64 {
    match kind {
        ContentKind::Catalog => 1,
        ContentKind::Node => 2,
        ContentKind::Entry => 3,
    }
}

/// Build a reference in the stub encoding.
pub fn link(object_id: i64, kind: ContentKind) -> ContentReference {
    ContentReference::new(object_id * 4 + kind_tag(kind))
}

/// A reference the stub converter does not classify as catalog content.
pub fn foreign_link(object_id: i64) -> ContentReference {
    ContentReference::new(object_id * 4)
}

impl ReferenceConverter for StubReferenceConverter {
    fn kind_of(&self, content_link: &ContentReference) -> Option<ContentKind> {
        match content_link.link_id().rem_euclid(4) {
            1 => Some(ContentKind::Catalog),
            2 => Some(ContentKind::Node),
            3 => Some(ContentKind::Entry),
            _ => None,
        }
    }

    fn object_id_of(&self, content_link: &ContentReference) -> i64 {
        content_link.link_id().div_euclid(4)
    }

    fn references_from_codes(
        &self,
        codes: &[String],
        kind: Option<ContentKind>,
    ) -> CatypeResult<HashMap<String, ContentReference>> {
        let known = self
            .codes
            .lock()
            .map_err(|_| catype_core::ClassificationError::Failed {
                reason: "code table poisoned".to_string(),
            })?;

        Ok(codes
            .iter()
            .filter_map(|code| known.get(code).map(|link| (code.clone(), *link)))
            .filter(|(_, link)| kind.is_none() || self.kind_of(link) == kind)
            .collect())
    }
}

// ============================================================================
// BULK LOOKUP
// ============================================================================

/// Bulk lookup stub that records every request it receives.
///
/// Rows are answered from the configured tables; ids without a row are
/// silently absent, like a backing store that has no such object.
#[derive(Debug, Default)]
pub struct CountingMetaClassLookup {
    nodes: HashMap<i64, String>,
    entries: HashMap<i64, String>,
    requests: Mutex<Vec<MetaClassRequest>>,
    failing: AtomicBool,
}

impl CountingMetaClassLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, id: i64, meta_class_name: impl Into<String>) -> Self {
        self.nodes.insert(id, meta_class_name.into());
        self
    }

    pub fn with_entry(mut self, id: i64, meta_class_name: impl Into<String>) -> Self {
        self.entries.insert(id, meta_class_name.into());
        self
    }

    /// Make subsequent calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<MetaClassRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<MetaClassRequest> {
        self.requests().pop()
    }
}

impl MetaClassLookup for CountingMetaClassLookup {
    fn fetch_meta_class_names(&self, request: &MetaClassRequest) -> CatypeResult<MetaClassNames> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(LookupError::BackingStoreUnavailable {
                reason: "stub configured to fail".to_string(),
            }
            .into());
        }

        let rows = |ids: &std::collections::BTreeSet<i64>, table: &HashMap<i64, String>| {
            ids.iter()
                .filter_map(|id| table.get(id).map(|name| MetaClassRow::new(*id, name.clone())))
                .collect::<Vec<_>>()
        };

        Ok(MetaClassNames {
            entries: rows(&request.entry_ids, &self.entries),
            nodes: rows(&request.node_ids, &self.nodes),
        })
    }
}

/// Bulk lookup that answers with a fixed response regardless of the request.
#[derive(Debug, Clone, Default)]
pub struct CannedMetaClassLookup {
    pub response: MetaClassNames,
}

impl MetaClassLookup for CannedMetaClassLookup {
    fn fetch_meta_class_names(&self, _request: &MetaClassRequest) -> CatypeResult<MetaClassNames> {
        Ok(self.response.clone())
    }
}

// ============================================================================
// CACHE STUBS
// ============================================================================

/// Cache store whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingCacheStore;

impl<V> CacheStore<V> for FailingCacheStore {
    fn get(&self, _key: &str) -> CatypeResult<Option<V>> {
        Err(unavailable())
    }

    fn insert(&self, _key: &str, _value: V, _policy: EvictionPolicy) -> CatypeResult<()> {
        Err(unavailable())
    }

    fn invalidate(&self, _dependency_key: &str) -> CatypeResult<u64> {
        Err(unavailable())
    }

    fn stats(&self) -> CatypeResult<CacheStats> {
        Err(unavailable())
    }
}

fn unavailable() -> CatypeError {
    CacheError::Unavailable {
        reason: "stub cache is down".to_string(),
    }
    .into()
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// 2024-01-01 00:00:00 UTC.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            millis: AtomicI64::new(1_704_067_200_000),
        })
    }

    pub fn advance(&self, by: std::time::Duration) {
        self.millis
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl CacheClock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.millis.load(Ordering::SeqCst))
            .unwrap_or_default()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_kind() -> impl Strategy<Value = ContentKind> {
        prop_oneof![
            Just(ContentKind::Catalog),
            Just(ContentKind::Node),
            Just(ContentKind::Entry),
        ]
    }

    /// A catalog-content reference in the stub encoding.
    pub fn arb_link() -> impl Strategy<Value = ContentReference> {
        (1i64..64, arb_kind()).prop_map(|(id, kind)| link(id, kind))
    }

    /// A reference that may or may not be catalog content.
    pub fn arb_any_link() -> impl Strategy<Value = ContentReference> {
        prop_oneof![
            4 => arb_link(),
            1 => (1i64..64).prop_map(foreign_link),
        ]
    }

    /// A batch of references, duplicates allowed.
    pub fn arb_batch() -> impl Strategy<Value = Vec<ContentReference>> {
        prop::collection::vec(arb_any_link(), 0..24)
    }

    /// A meta class name from the fixture registry, in random letter case,
    /// or an unmapped name.
    pub fn arb_meta_class_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Category".to_string()),
            Just("CATEGORY".to_string()),
            Just("product".to_string()),
            Just("Product".to_string()),
            Just("fashionvariant".to_string()),
            Just("LegacyBundle".to_string()),
        ]
    }
}
