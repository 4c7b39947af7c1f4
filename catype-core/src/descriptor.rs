//! Content-type descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural base type of catalog content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogBaseType {
    Catalog,
    Node,
    Product,
    Variation,
    Bundle,
    Package,
}

/// Which domain a declared content type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFamily {
    /// Derives from the catalog content base kind.
    CatalogContent(CatalogBaseType),
    /// Anything else (pages, blocks, media). Never mapped to meta classes.
    Other,
}

impl ContentFamily {
    /// Whether the family derives from catalog content.
    pub fn is_catalog_content(&self) -> bool {
        matches!(self, ContentFamily::CatalogContent(_))
    }

    /// Catalog base type, or `None` for other content.
    pub fn base_type(&self) -> Option<CatalogBaseType> {
        match self {
            ContentFamily::CatalogContent(base) => Some(*base),
            ContentFamily::Other => None,
        }
    }
}

/// A declared content type.
///
/// `name` is the declaring model's own name. `meta_class_name` is the explicit
/// backing-store name annotation, if any; when it is absent or blank the
/// backing store is expected to use `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentTypeDescriptor {
    pub id: i32,
    pub name: String,
    pub family: ContentFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_class_name: Option<String>,
}

impl ContentTypeDescriptor {
    /// Create a descriptor without a meta class annotation.
    pub fn new(id: i32, name: impl Into<String>, family: ContentFamily) -> Self {
        Self {
            id,
            name: name.into(),
            family,
            meta_class_name: None,
        }
    }

    /// Annotate the descriptor with an explicit backing-store name.
    pub fn with_meta_class_name(mut self, meta_class_name: impl Into<String>) -> Self {
        self.meta_class_name = Some(meta_class_name.into());
        self
    }

    /// The backing-store type name this descriptor answers to.
    ///
    /// A blank annotation counts as no annotation.
    pub fn backing_name(&self) -> &str {
        match self.meta_class_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.name,
        }
    }

    /// Whether this type is eligible for meta class mapping.
    pub fn is_catalog_content(&self) -> bool {
        self.family.is_catalog_content()
    }
}

impl fmt::Display for ContentTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}
