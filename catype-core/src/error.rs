//! Error types for CATYPE operations

use std::time::Duration;
use thiserror::Error;

/// Backing-store lookup errors.
///
/// Raised by [`MetaClassLookup`](crate::traits::MetaClassLookup)
/// implementations; every variant counts as a backing-store failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Backing store unavailable: {reason}")]
    BackingStoreUnavailable { reason: String },

    #[error("Backing store timed out after {after:?}")]
    Timeout { after: Duration },
}

/// Type-name index construction errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("Duplicate type mapping for meta class '{meta_class_name}': {existing} and {duplicate}")]
    DuplicateTypeMapping {
        meta_class_name: String,
        existing: String,
        duplicate: String,
    },
}

/// Content-type registry errors.
///
/// `LoadFailed` is for registry implementations that read from an external source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No catalog content type is registered")]
    CatalogTypeMissing,

    #[error("Failed to load content types: {reason}")]
    LoadFailed { reason: String },
}

/// Reference classification errors.
///
/// Unknown codes are not errors; converters leave them out of their result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("Classification failed: {reason}")]
    Failed { reason: String },
}

/// Cache store errors.
///
/// Store implementations report these; the cached resolver logs them and
/// carries on without the cache.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Snapshot loading errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid snapshot: {reason}")]
    Parse { reason: String },
}

/// Master error type for all CATYPE errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatypeError {
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl CatypeError {
    /// Whether the error came from the backing metadata store.
    pub fn is_backing_store_failure(&self) -> bool {
        matches!(self, CatypeError::Lookup(_))
    }
}

/// Result type alias for CATYPE operations.
pub type CatypeResult<T> = Result<T, CatypeError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_mapping_display() {
        let err = MappingError::DuplicateTypeMapping {
            meta_class_name: "product".to_string(),
            existing: "FashionProduct".to_string(),
            duplicate: "ShoeProduct".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("product"));
        assert!(msg.contains("FashionProduct"));
        assert!(msg.contains("ShoeProduct"));
    }

    #[test]
    fn test_timeout_is_backing_store_failure() {
        let err: CatypeError = LookupError::Timeout {
            after: Duration::from_secs(5),
        }
        .into();
        assert!(err.is_backing_store_failure());
        assert_eq!(err.to_string(), "Lookup error: Backing store timed out after 5s");
    }

    #[test]
    fn test_master_error_from_lookup() {
        let err: CatypeError = LookupError::BackingStoreUnavailable {
            reason: "connection refused".to_string(),
        }
        .into();
        assert!(err.is_backing_store_failure());
        assert!(format!("{}", err).starts_with("Lookup error: Backing store unavailable"));
    }

    #[test]
    fn test_master_error_from_others_is_not_backing_store() {
        let err: CatypeError = CacheError::LockPoisoned.into();
        assert!(!err.is_backing_store_failure());

        let err: CatypeError = RegistryError::CatalogTypeMissing.into();
        assert!(matches!(err, CatypeError::Registry(_)));
    }
}
