//! Case-insensitive index from backing-store type names to content types.

use std::collections::HashMap;

use catype_core::{CatypeResult, ContentTypeDescriptor, MappingError};

/// Immutable lookup table built once from the content-type registry.
///
/// Only catalog content descriptors are indexed. Each is keyed by its
/// backing-store name (the explicit annotation, or the model name when the
/// annotation is absent or blank), folded to lowercase.
#[derive(Debug, Clone, Default)]
pub struct TypeNameIndex {
    by_name: HashMap<String, ContentTypeDescriptor>,
}

impl TypeNameIndex {
    /// Build the index.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::DuplicateTypeMapping`] when two catalog
    /// descriptors answer to the same name, ignoring case.
    pub fn build<I>(descriptors: I) -> CatypeResult<Self>
    where
        I: IntoIterator<Item = ContentTypeDescriptor>,
    {
        let mut by_name: HashMap<String, ContentTypeDescriptor> = HashMap::new();
        let mut skipped = 0usize;

        for descriptor in descriptors {
            if !descriptor.is_catalog_content() {
                skipped += 1;
                continue;
            }

            let key = fold(descriptor.backing_name());
            if let Some(existing) = by_name.get(&key) {
                return Err(MappingError::DuplicateTypeMapping {
                    meta_class_name: descriptor.backing_name().to_string(),
                    existing: existing.name.clone(),
                    duplicate: descriptor.name.clone(),
                }
                .into());
            }
            by_name.insert(key, descriptor);
        }

        tracing::info!(mapped = by_name.len(), skipped, "Built meta class index");

        Ok(Self { by_name })
    }

    /// Look up a backing-store type name, ignoring case.
    pub fn get(&self, meta_class_name: &str) -> Option<&ContentTypeDescriptor> {
        self.by_name.get(&fold(meta_class_name))
    }

    /// Whether a backing-store type name is mapped, ignoring case.
    pub fn contains(&self, meta_class_name: &str) -> bool {
        self.get(meta_class_name).is_some()
    }

    /// Number of mapped type names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no catalog content type was mapped.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Indexed descriptors, in no particular order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ContentTypeDescriptor> {
        self.by_name.values()
    }
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}
