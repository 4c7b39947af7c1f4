//! Resolution results

use serde::{Deserialize, Serialize};

use crate::descriptor::{CatalogBaseType, ContentTypeDescriptor};
use crate::identity::ContentReference;

/// A content reference paired with the content type it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedContentType {
    pub content_link: ContentReference,
    pub content_type: ContentTypeDescriptor,
}

impl ResolvedContentType {
    /// Pair a reference with its resolved type.
    pub fn new(content_link: ContentReference, content_type: ContentTypeDescriptor) -> Self {
        Self {
            content_link,
            content_type,
        }
    }

    /// Whether the resolved type is exactly the named model.
    pub fn is_of_type(&self, model_name: &str) -> bool {
        self.content_type.name == model_name
    }

    /// Whether the resolved type derives from the given catalog base type.
    pub fn is_base(&self, base: CatalogBaseType) -> bool {
        self.content_type.family.base_type() == Some(base)
    }

    /// Split into the reference and its type.
    pub fn into_parts(self) -> (ContentReference, ContentTypeDescriptor) {
        (self.content_link, self.content_type)
    }
}

impl From<(ContentReference, ContentTypeDescriptor)> for ResolvedContentType {
    fn from((content_link, content_type): (ContentReference, ContentTypeDescriptor)) -> Self {
        Self::new(content_link, content_type)
    }
}
