//! JSON snapshot of a catalog.
//!
//! A snapshot carries everything the resolver needs from the outside world:
//! the declared content types, the catalog type, and the catalog objects
//! with their link ids, codes and backing-store type names. One loaded
//! [`SnapshotCatalog`] implements all three collaborator traits, which makes
//! it suitable for offline resolution, fixtures and the `resolve_snapshot`
//! binary.
//!
//! ```json
//! {
//!   "catalog_type": { "id": 1, "name": "CatalogContent", "family": { "catalog_content": "catalog" } },
//!   "descriptors": [
//!     { "id": 3, "name": "FashionProduct", "family": { "catalog_content": "product" }, "meta_class_name": "Product" }
//!   ],
//!   "objects": [
//!     { "link_id": 101, "object_id": 1, "kind": "catalog", "code": "fashion" },
//!     { "link_id": 309, "object_id": 9, "kind": "entry", "code": "shirt-1", "meta_class_name": "Product" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use catype_core::{
    CatypeError, CatypeResult, ContentKind, ContentReference, ContentTypeDescriptor,
    ContentTypeRegistry, MetaClassLookup, MetaClassNames, MetaClassRequest, MetaClassRow,
    ReferenceConverter, RegistryError, SnapshotError,
};

/// One catalog object in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotObject {
    pub link_id: i64,
    pub object_id: i64,
    pub kind: ContentKind,
    /// Human-readable code. Blank codes are not addressable by code.
    #[serde(default)]
    pub code: String,
    /// Backing-store type name. Catalogs and untyped objects leave it out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_class_name: Option<String>,
}

impl SnapshotObject {
    /// Create an object without a meta class name.
    pub fn new(link_id: i64, object_id: i64, kind: ContentKind, code: impl Into<String>) -> Self {
        Self {
            link_id,
            object_id,
            kind,
            code: code.into(),
            meta_class_name: None,
        }
    }

    /// Set the backing-store type name.
    pub fn with_meta_class_name(mut self, name: impl Into<String>) -> Self {
        self.meta_class_name = Some(name.into());
        self
    }

    /// The object's reference.
    pub fn content_link(&self) -> ContentReference {
        ContentReference::new(self.link_id)
    }
}

/// Serialized form of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub descriptors: Vec<ContentTypeDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_type: Option<ContentTypeDescriptor>,
    #[serde(default)]
    pub objects: Vec<SnapshotObject>,
}

/// Validated, indexed snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotCatalog {
    document: SnapshotDocument,
    by_link: HashMap<ContentReference, usize>,
    by_object: HashMap<(ContentKind, i64), usize>,
    by_code: HashMap<String, usize>,
}

impl SnapshotCatalog {
    /// Load and validate a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> CatypeResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| SnapshotError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate a snapshot from JSON text.
    pub fn from_json(json: &str) -> CatypeResult<Self> {
        let document: SnapshotDocument =
            serde_json::from_str(json).map_err(|e| SnapshotError::Parse {
                reason: e.to_string(),
            })?;
        Self::from_document(document)
    }

    /// Index a snapshot document.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Parse`] when a link id, a (kind, object id)
    /// pair or a non-blank code appears twice.
    pub fn from_document(document: SnapshotDocument) -> CatypeResult<Self> {
        let mut by_link = HashMap::with_capacity(document.objects.len());
        let mut by_object = HashMap::with_capacity(document.objects.len());
        let mut by_code = HashMap::new();

        for (position, object) in document.objects.iter().enumerate() {
            if by_link.insert(object.content_link(), position).is_some() {
                return Err(parse_error(format!("duplicate link id {}", object.link_id)));
            }

            if by_object
                .insert((object.kind, object.object_id), position)
                .is_some()
            {
                return Err(parse_error(format!(
                    "duplicate {} object id {}",
                    object.kind, object.object_id
                )));
            }

            let code = object.code.trim();
            if !code.is_empty() && by_code.insert(code.to_string(), position).is_some() {
                return Err(parse_error(format!("duplicate code '{code}'")));
            }
        }

        tracing::info!(
            descriptors = document.descriptors.len(),
            objects = document.objects.len(),
            has_catalog_type = document.catalog_type.is_some(),
            "Loaded catalog snapshot"
        );

        Ok(Self {
            document,
            by_link,
            by_object,
            by_code,
        })
    }

    /// Get the validated document.
    pub fn document(&self) -> &SnapshotDocument {
        &self.document
    }

    /// Find an object by its link id.
    pub fn object(&self, content_link: &ContentReference) -> Option<&SnapshotObject> {
        self.by_link
            .get(content_link)
            .map(|&position| &self.document.objects[position])
    }

    /// Find an object by its code.
    pub fn object_by_code(&self, code: &str) -> Option<&SnapshotObject> {
        self.by_code
            .get(code.trim())
            .map(|&position| &self.document.objects[position])
    }

    fn object_by_id(&self, kind: ContentKind, object_id: i64) -> Option<&SnapshotObject> {
        self.by_object
            .get(&(kind, object_id))
            .map(|&position| &self.document.objects[position])
    }

    fn rows<'a>(
        &self,
        kind: ContentKind,
        ids: impl IntoIterator<Item = &'a i64>,
    ) -> Vec<MetaClassRow> {
        ids.into_iter()
            .filter_map(|&id| {
                let name = self.object_by_id(kind, id)?.meta_class_name.as_ref()?;
                Some(MetaClassRow::new(id, name.clone()))
            })
            .collect()
    }
}

fn parse_error(reason: String) -> CatypeError {
    SnapshotError::Parse { reason }.into()
}

impl ReferenceConverter for SnapshotCatalog {
    fn kind_of(&self, content_link: &ContentReference) -> Option<ContentKind> {
        self.object(content_link).map(|object| object.kind)
    }

    /// Object id of a known reference; unknown references echo their link id.
    fn object_id_of(&self, content_link: &ContentReference) -> i64 {
        self.object(content_link)
            .map(|object| object.object_id)
            .unwrap_or_else(|| content_link.link_id())
    }

    fn references_from_codes(
        &self,
        codes: &[String],
        kind: Option<ContentKind>,
    ) -> CatypeResult<HashMap<String, ContentReference>> {
        Ok(codes
            .iter()
            .filter_map(|code| {
                let object = self.object_by_code(code)?;
                if kind.is_some_and(|k| k != object.kind) {
                    return None;
                }
                Some((code.clone(), object.content_link()))
            })
            .collect())
    }
}

impl MetaClassLookup for SnapshotCatalog {
    fn fetch_meta_class_names(&self, request: &MetaClassRequest) -> CatypeResult<MetaClassNames> {
        Ok(MetaClassNames {
            entries: self.rows(ContentKind::Entry, &request.entry_ids),
            nodes: self.rows(ContentKind::Node, &request.node_ids),
        })
    }
}

impl ContentTypeRegistry for SnapshotCatalog {
    fn list_descriptors(&self) -> CatypeResult<Vec<ContentTypeDescriptor>> {
        Ok(self.document.descriptors.clone())
    }

    fn load_catalog_descriptor(&self) -> CatypeResult<ContentTypeDescriptor> {
        self.document
            .catalog_type
            .clone()
            .ok_or_else(|| RegistryError::CatalogTypeMissing.into())
    }
}
