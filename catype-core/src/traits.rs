//! Collaborator traits
//!
//! The resolver depends on three external collaborators: a reference
//! converter that understands the link id encoding, a bulk metadata lookup
//! against the backing store, and the registry of declared content types.
//! All calls are synchronous and may block on I/O; implementations must be
//! safe to share across threads.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::descriptor::ContentTypeDescriptor;
use crate::error::CatypeResult;
use crate::identity::{ContentKind, ContentReference};
use crate::resolved::ResolvedContentType;

/// Classifies content references and translates codes into references.
///
/// Resolvers never rebuild a reference from an object id; results always
/// carry the caller's original reference.
pub trait ReferenceConverter: Send + Sync {
    /// Structural kind of a reference, or `None` when it is not catalog content.
    fn kind_of(&self, content_link: &ContentReference) -> Option<ContentKind>;

    /// Numeric object id encoded in the reference.
    fn object_id_of(&self, content_link: &ContentReference) -> i64;

    /// Translate human-readable codes into references.
    ///
    /// Unknown codes are absent from the returned map. When `kind` is given,
    /// only references of that kind are returned.
    fn references_from_codes(
        &self,
        codes: &[String],
        kind: Option<ContentKind>,
    ) -> CatypeResult<HashMap<String, ContentReference>>;
}

/// Request for the backing-store type names of a set of nodes and entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaClassRequest {
    pub entry_ids: BTreeSet<i64>,
    pub node_ids: BTreeSet<i64>,
}

impl MetaClassRequest {
    /// Whether neither id set has anything to look up.
    pub fn is_empty(&self) -> bool {
        self.entry_ids.is_empty() && self.node_ids.is_empty()
    }

    /// Total number of ids requested.
    pub fn len(&self) -> usize {
        self.entry_ids.len() + self.node_ids.len()
    }
}

/// One row of a bulk metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaClassRow {
    pub id: i64,
    pub meta_class_name: String,
}

impl MetaClassRow {
    /// Create a row for one object id.
    pub fn new(id: i64, meta_class_name: impl Into<String>) -> Self {
        Self {
            id,
            meta_class_name: meta_class_name.into(),
        }
    }
}

/// Result tables of a bulk metadata lookup, one per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaClassNames {
    pub entries: Vec<MetaClassRow>,
    pub nodes: Vec<MetaClassRow>,
}

/// Bulk lookup of backing-store type names.
pub trait MetaClassLookup: Send + Sync {
    /// Fetch type names for both id sets in a single round trip.
    fn fetch_meta_class_names(&self, request: &MetaClassRequest) -> CatypeResult<MetaClassNames>;
}

/// Registry of every declared content type.
pub trait ContentTypeRegistry: Send + Sync {
    fn list_descriptors(&self) -> CatypeResult<Vec<ContentTypeDescriptor>>;

    /// The single well-known type every catalog resolves to.
    fn load_catalog_descriptor(&self) -> CatypeResult<ContentTypeDescriptor>;
}

/// Resolves content references into their declared content types.
///
/// Every input yields at most one output; references that cannot be
/// resolved are left out rather than reported as errors.
pub trait ContentTypeResolver: Send + Sync {
    fn resolve_content_types(
        &self,
        content_links: &[ContentReference],
    ) -> CatypeResult<Vec<ResolvedContentType>>;

    /// Resolve content codes, optionally restricted to one kind.
    fn resolve_codes(
        &self,
        codes: &[String],
        kind: Option<ContentKind>,
    ) -> CatypeResult<Vec<ResolvedContentType>>;

    /// Resolve content codes of any kind.
    fn resolve_content_types_by_code(
        &self,
        codes: &[String],
    ) -> CatypeResult<Vec<ResolvedContentType>> {
        self.resolve_codes(codes, None)
    }
}

impl<R: ContentTypeResolver + ?Sized> ContentTypeResolver for Arc<R> {
    fn resolve_content_types(
        &self,
        content_links: &[ContentReference],
    ) -> CatypeResult<Vec<ResolvedContentType>> {
        (**self).resolve_content_types(content_links)
    }

    fn resolve_codes(
        &self,
        codes: &[String],
        kind: Option<ContentKind>,
    ) -> CatypeResult<Vec<ResolvedContentType>> {
        (**self).resolve_codes(codes, kind)
    }
}

/// Translate codes into references in input order, dropping unknown codes
/// and repeated codes.
pub fn links_for_codes(
    converter: &dyn ReferenceConverter,
    codes: &[String],
    kind: Option<ContentKind>,
) -> CatypeResult<Vec<ContentReference>> {
    let by_code = converter.references_from_codes(codes, kind)?;
    let mut seen = BTreeSet::new();
    Ok(codes
        .iter()
        .filter(|code| seen.insert(code.as_str()))
        .filter_map(|code| by_code.get(code).copied())
        .collect())
}
