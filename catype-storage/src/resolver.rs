//! Batch resolution of catalog content references.
//!
//! Catalogs resolve to the registry's well-known catalog type without a
//! round trip. Nodes and entries are reduced to object ids and looked up in
//! one bulk call; the returned meta class names are mapped through the
//! [`TypeNameIndex`]. Rows whose name is not indexed are dropped.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use catype_core::{
    links_for_codes, CatypeResult, ContentKind, ContentReference, ContentTypeDescriptor,
    ContentTypeRegistry, ContentTypeResolver, MetaClassLookup, MetaClassRequest, MetaClassRow,
    ReferenceConverter, ResolvedContentType,
};

use crate::type_index::TypeNameIndex;

/// Resolver backed by the catalog metadata store.
pub struct CatalogContentTypeResolver {
    converter: Arc<dyn ReferenceConverter>,
    lookup: Arc<dyn MetaClassLookup>,
    index: TypeNameIndex,
    catalog_type: ContentTypeDescriptor,
}

impl CatalogContentTypeResolver {
    /// Create a resolver, building the type-name index from the registry.
    ///
    /// # Errors
    ///
    /// Fails if the registry cannot be read, has no catalog type, or
    /// declares two catalog types with the same meta class name.
    pub fn new(
        converter: Arc<dyn ReferenceConverter>,
        lookup: Arc<dyn MetaClassLookup>,
        registry: &dyn ContentTypeRegistry,
    ) -> CatypeResult<Self> {
        let index = TypeNameIndex::build(registry.list_descriptors()?)?;
        let catalog_type = registry.load_catalog_descriptor()?;
        Ok(Self::from_parts(converter, lookup, index, catalog_type))
    }

    /// Create a resolver from an already built index.
    pub fn from_parts(
        converter: Arc<dyn ReferenceConverter>,
        lookup: Arc<dyn MetaClassLookup>,
        index: TypeNameIndex,
        catalog_type: ContentTypeDescriptor,
    ) -> Self {
        Self {
            converter,
            lookup,
            index,
            catalog_type,
        }
    }

    /// Get the meta class index built at construction.
    pub fn index(&self) -> &TypeNameIndex {
        &self.index
    }

    /// Get the type every catalog resolves to.
    pub fn catalog_type(&self) -> &ContentTypeDescriptor {
        &self.catalog_type
    }

    /// Get the reference converter shared with callers.
    pub fn converter(&self) -> &Arc<dyn ReferenceConverter> {
        &self.converter
    }

    /// Map one result table back onto the requested references.
    ///
    /// `pending` holds the requested (kind, object id) pairs not yet
    /// answered; an answered pair is removed so repeated rows are ignored.
    fn map_rows(
        &self,
        rows: Vec<MetaClassRow>,
        kind: ContentKind,
        pending: &mut HashMap<(ContentKind, i64), ContentReference>,
        out: &mut Vec<ResolvedContentType>,
    ) {
        for row in rows {
            let Some(content_link) = pending.remove(&(kind, row.id)) else {
                tracing::warn!(%kind, id = row.id, "Ignoring unrequested or repeated meta class row");
                continue;
            };

            match self.index.get(&row.meta_class_name) {
                Some(content_type) => {
                    out.push(ResolvedContentType::new(content_link, content_type.clone()));
                }
                None => {
                    tracing::debug!(
                        %kind,
                        id = row.id,
                        meta_class = %row.meta_class_name,
                        "No content type mapped for meta class"
                    );
                }
            }
        }
    }
}

impl ContentTypeResolver for CatalogContentTypeResolver {
    fn resolve_content_types(
        &self,
        content_links: &[ContentReference],
    ) -> CatypeResult<Vec<ResolvedContentType>> {
        let mut seen = HashSet::with_capacity(content_links.len());
        let mut result = Vec::with_capacity(content_links.len());
        let mut request = MetaClassRequest::default();
        let mut pending = HashMap::new();

        for content_link in content_links {
            if !seen.insert(*content_link) {
                continue;
            }

            match self.converter.kind_of(content_link) {
                Some(ContentKind::Catalog) => {
                    result.push(ResolvedContentType::new(
                        *content_link,
                        self.catalog_type.clone(),
                    ));
                }
                Some(kind) => {
                    let object_id = self.converter.object_id_of(content_link);
                    if pending.contains_key(&(kind, object_id)) {
                        continue;
                    }
                    pending.insert((kind, object_id), *content_link);
                    match kind {
                        ContentKind::Node => request.node_ids.insert(object_id),
                        _ => request.entry_ids.insert(object_id),
                    };
                }
                None => {
                    tracing::debug!(%content_link, "Skipping reference that is not catalog content");
                }
            }
        }

        tracing::debug!(
            catalogs = result.len(),
            nodes = request.node_ids.len(),
            entries = request.entry_ids.len(),
            "Partitioned content references"
        );

        if request.is_empty() {
            return Ok(result);
        }

        let names = self.lookup.fetch_meta_class_names(&request)?;
        self.map_rows(names.nodes, ContentKind::Node, &mut pending, &mut result);
        self.map_rows(names.entries, ContentKind::Entry, &mut pending, &mut result);

        tracing::debug!(
            requested = request.len(),
            resolved = result.len(),
            unresolved = pending.len(),
            "Resolved content types"
        );

        Ok(result)
    }

    fn resolve_codes(
        &self,
        codes: &[String],
        kind: Option<ContentKind>,
    ) -> CatypeResult<Vec<ResolvedContentType>> {
        let content_links = links_for_codes(self.converter.as_ref(), codes, kind)?;
        self.resolve_content_types(&content_links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catype_core::{CatypeError, LookupError, MetaClassNames, RegistryError};
    use catype_test_utils::generators::{arb_batch, arb_meta_class_name};
    use catype_test_utils::{
        fixtures, foreign_link, link, CannedMetaClassLookup, CountingMetaClassLookup,
        FixedRegistry, StubReferenceConverter,
    };
    use proptest::prelude::*;

    fn resolver_with(
        converter: StubReferenceConverter,
        lookup: Arc<dyn MetaClassLookup>,
    ) -> CatalogContentTypeResolver {
        CatalogContentTypeResolver::new(Arc::new(converter), lookup, &FixedRegistry::default())
            .unwrap()
    }

    fn fashion_lookup() -> Arc<CountingMetaClassLookup> {
        Arc::new(
            CountingMetaClassLookup::new()
                .with_node(5, "Category")
                .with_entry(9, "Product")
                .with_entry(10, "FashionVariant")
                .with_entry(11, "LegacyBundle"),
        )
    }

    #[test]
    fn test_mixed_batch_resolves_in_kind_order() {
        let lookup = fashion_lookup();
        let resolver = resolver_with(StubReferenceConverter::new(), lookup.clone());

        let catalog = link(1, ContentKind::Catalog);
        let node = link(5, ContentKind::Node);
        let entry = link(9, ContentKind::Entry);

        let result = resolver.resolve_content_types(&[entry, node, catalog]).unwrap();

        assert_eq!(
            result,
            vec![
                ResolvedContentType::new(catalog, fixtures::catalog_type()),
                ResolvedContentType::new(node, fixtures::category_type()),
                ResolvedContentType::new(entry, fixtures::product_type()),
            ]
        );
        assert_eq!(lookup.call_count(), 1);

        let request = lookup.last_request().unwrap();
        assert_eq!(request.node_ids.into_iter().collect::<Vec<_>>(), vec![5]);
        assert_eq!(request.entry_ids.into_iter().collect::<Vec<_>>(), vec![9]);
    }

    #[test]
    fn test_catalogs_need_no_lookup() {
        let lookup = fashion_lookup();
        let resolver = resolver_with(StubReferenceConverter::new(), lookup.clone());

        let catalogs = [link(1, ContentKind::Catalog), link(2, ContentKind::Catalog)];
        let result = resolver.resolve_content_types(&catalogs).unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| r.content_type == fixtures::catalog_type()));
        assert_eq!(lookup.call_count(), 0);
    }

    #[test]
    fn test_empty_batch_skips_lookup() {
        let lookup = fashion_lookup();
        let resolver = resolver_with(StubReferenceConverter::new(), lookup.clone());

        assert!(resolver.resolve_content_types(&[]).unwrap().is_empty());
        assert_eq!(lookup.call_count(), 0);
    }

    #[test]
    fn test_unmapped_and_missing_rows_are_dropped() {
        let lookup = fashion_lookup();
        let resolver = resolver_with(StubReferenceConverter::new(), lookup.clone());

        // 11 maps to an unregistered meta class; 12 has no row at all
        let links = [
            link(10, ContentKind::Entry),
            link(11, ContentKind::Entry),
            link(12, ContentKind::Entry),
        ];
        let result = resolver.resolve_content_types(&links).unwrap();

        assert_eq!(
            result,
            vec![ResolvedContentType::new(
                link(10, ContentKind::Entry),
                fixtures::variant_type()
            )]
        );
    }

    #[test]
    fn test_foreign_references_are_dropped() {
        let lookup = fashion_lookup();
        let resolver = resolver_with(StubReferenceConverter::new(), lookup.clone());

        let result = resolver.resolve_content_types(&[foreign_link(9)]).unwrap();
        assert!(result.is_empty());
        assert_eq!(lookup.call_count(), 0);
    }

    #[test]
    fn test_duplicate_inputs_yield_one_output() {
        let lookup = fashion_lookup();
        let resolver = resolver_with(StubReferenceConverter::new(), lookup.clone());

        let entry = link(9, ContentKind::Entry);
        let catalog = link(1, ContentKind::Catalog);
        let result = resolver
            .resolve_content_types(&[entry, catalog, entry, catalog])
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(lookup.last_request().unwrap().entry_ids.len(), 1);
    }

    #[test]
    fn test_same_object_id_across_kinds() {
        let lookup = Arc::new(
            CountingMetaClassLookup::new()
                .with_node(7, "Category")
                .with_entry(7, "Product"),
        );
        let resolver = resolver_with(StubReferenceConverter::new(), lookup.clone());

        let node = link(7, ContentKind::Node);
        let entry = link(7, ContentKind::Entry);
        let result = resolver.resolve_content_types(&[node, entry]).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].content_link, node);
        assert!(result[0].is_of_type("FashionNode"));
        assert_eq!(result[1].content_link, entry);
        assert!(result[1].is_of_type("FashionProduct"));
    }

    #[test]
    fn test_unrequested_and_repeated_rows_are_ignored() {
        let lookup = Arc::new(CannedMetaClassLookup {
            response: MetaClassNames {
                entries: vec![
                    MetaClassRow::new(9, "Product"),
                    MetaClassRow::new(9, "FashionVariant"),
                    MetaClassRow::new(99, "Product"),
                ],
                nodes: vec![MetaClassRow::new(9, "Category")],
            },
        });
        let resolver = resolver_with(StubReferenceConverter::new(), lookup);

        let entry = link(9, ContentKind::Entry);
        let result = resolver.resolve_content_types(&[entry]).unwrap();

        assert_eq!(
            result,
            vec![ResolvedContentType::new(entry, fixtures::product_type())]
        );
    }

    #[test]
    fn test_backing_store_failure_propagates() {
        let lookup = fashion_lookup();
        lookup.set_failing(true);
        let resolver = resolver_with(StubReferenceConverter::new(), lookup.clone());

        let err = resolver
            .resolve_content_types(&[link(1, ContentKind::Catalog), link(9, ContentKind::Entry)])
            .unwrap_err();

        assert!(matches!(
            err,
            CatypeError::Lookup(LookupError::BackingStoreUnavailable { .. })
        ));
    }

    #[test]
    fn test_construction_fails_without_catalog_type() {
        let result = CatalogContentTypeResolver::new(
            Arc::new(StubReferenceConverter::new()),
            fashion_lookup(),
            &FixedRegistry::without_catalog(fixtures::all_descriptors()),
        );
        assert!(result.is_err());
    }

    struct SlowLookup;

    impl MetaClassLookup for SlowLookup {
        fn fetch_meta_class_names(
            &self,
            _request: &MetaClassRequest,
        ) -> CatypeResult<MetaClassNames> {
            Err(LookupError::Timeout {
                after: std::time::Duration::from_secs(30),
            }
            .into())
        }
    }

    #[test]
    fn test_lookup_timeout_propagates() {
        let resolver = resolver_with(StubReferenceConverter::new(), Arc::new(SlowLookup));

        let err = resolver
            .resolve_content_types(&[link(5, ContentKind::Node)])
            .unwrap_err();
        assert!(err.is_backing_store_failure());

        let catalogs = resolver
            .resolve_content_types(&[link(1, ContentKind::Catalog)])
            .unwrap();
        assert_eq!(catalogs.len(), 1);
    }

    struct UnreachableRegistry;

    impl ContentTypeRegistry for UnreachableRegistry {
        fn list_descriptors(&self) -> CatypeResult<Vec<ContentTypeDescriptor>> {
            Err(RegistryError::LoadFailed {
                reason: "registry offline".to_string(),
            }
            .into())
        }

        fn load_catalog_descriptor(&self) -> CatypeResult<ContentTypeDescriptor> {
            Ok(fixtures::catalog_type())
        }
    }

    #[test]
    fn test_construction_fails_when_registry_cannot_load() {
        let result = CatalogContentTypeResolver::new(
            Arc::new(StubReferenceConverter::new()),
            fashion_lookup(),
            &UnreachableRegistry,
        );
        assert!(matches!(
            result,
            Err(CatypeError::Registry(RegistryError::LoadFailed { .. }))
        ));
    }

    #[test]
    fn test_resolve_codes_with_kind_filter() {
        let converter = StubReferenceConverter::new()
            .with_code("fashion", 1, ContentKind::Catalog)
            .with_code("shirts", 5, ContentKind::Node)
            .with_code("shirt-1", 9, ContentKind::Entry);
        let lookup = fashion_lookup();
        let resolver = resolver_with(converter, lookup.clone());

        let codes: Vec<String> = ["shirt-1", "shirts", "fashion", "unknown"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let all = resolver.resolve_content_types_by_code(&codes).unwrap();
        assert_eq!(all.len(), 3);

        let entries = resolver
            .resolve_codes(&codes, Some(ContentKind::Entry))
            .unwrap();
        assert_eq!(
            entries,
            vec![ResolvedContentType::new(
                link(9, ContentKind::Entry),
                fixtures::product_type()
            )]
        );
        let request = lookup.last_request().unwrap();
        assert!(request.node_ids.is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Outputs are a subset of the inputs, with at most one output per input.
        #[test]
        fn prop_outputs_subset_of_inputs(batch in arb_batch()) {
            let mut lookup = CountingMetaClassLookup::new();
            for id in 1..64 {
                lookup = lookup.with_node(id, "Category").with_entry(id, "Product");
            }
            let resolver = resolver_with(StubReferenceConverter::new(), Arc::new(lookup));

            let result = resolver.resolve_content_types(&batch).unwrap();
            let inputs: HashSet<_> = batch.iter().copied().collect();
            let outputs: HashSet<_> = result.iter().map(|r| r.content_link).collect();

            prop_assert!(result.len() <= inputs.len());
            prop_assert_eq!(outputs.len(), result.len());
            prop_assert!(outputs.is_subset(&inputs));
        }

        /// Catalog references always resolve to the catalog type.
        #[test]
        fn prop_catalogs_always_resolve(batch in arb_batch()) {
            let resolver = resolver_with(StubReferenceConverter::new(), fashion_lookup());
            let converter = StubReferenceConverter::new();

            let catalog_type = fixtures::catalog_type();

            let result = resolver.resolve_content_types(&batch).unwrap();
            let catalogs = batch
                .iter()
                .filter(|l| converter.kind_of(l) == Some(ContentKind::Catalog));
            for content_link in catalogs {
                let resolved = result.iter().find(|r| r.content_link == *content_link);
                prop_assert_eq!(resolved.map(|r| &r.content_type), Some(&catalog_type));
            }
        }

        /// Resolving twice against unchanged data gives the same set of pairs.
        #[test]
        fn prop_resolution_is_idempotent(batch in arb_batch()) {
            let resolver = resolver_with(StubReferenceConverter::new(), fashion_lookup());

            let first: HashSet<_> =
                resolver.resolve_content_types(&batch).unwrap().into_iter().collect();
            let second: HashSet<_> =
                resolver.resolve_content_types(&batch).unwrap().into_iter().collect();
            prop_assert_eq!(first, second);
        }

        /// Meta class names resolve regardless of letter case; unknown names never do.
        #[test]
        fn prop_meta_class_case_insensitive(name in arb_meta_class_name()) {
            let lookup = Arc::new(CountingMetaClassLookup::new().with_entry(3, name.clone()));
            let resolver = resolver_with(StubReferenceConverter::new(), lookup);

            let result = resolver.resolve_content_types(&[link(3, ContentKind::Entry)]).unwrap();
            let expected = fixtures::all_descriptors()
                .into_iter()
                .filter(|d| d.is_catalog_content())
                .find(|d| d.backing_name().eq_ignore_ascii_case(&name));

            prop_assert_eq!(result.first().map(|r| r.content_type.clone()), expected);
        }
    }
}
