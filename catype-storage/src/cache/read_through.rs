//! Read-through decorator over a content-type resolver.

use std::collections::HashSet;
use std::sync::Arc;

use catype_core::{
    links_for_codes, CacheConfig, CacheStore, CatypeResult, ContentKind, ContentReference,
    ContentTypeDescriptor, ContentTypeResolver, EvictionPolicy, ReferenceConverter,
    ResolvedContentType,
};

use super::key::CacheKeyScheme;

/// Resolver that answers from a keyed cache and forwards only misses.
///
/// # Type Parameters
///
/// - `R`: The wrapped resolver, called with cache misses only
/// - `C`: The cache store holding resolved content types
///
/// Cache failures never fail a resolution: a failed probe counts as a miss
/// and a failed insert is logged and skipped. Failures of the wrapped
/// resolver propagate and nothing from that call is cached.
pub struct CachedContentTypeResolver<R, C>
where
    R: ContentTypeResolver,
    C: CacheStore<ContentTypeDescriptor>,
{
    inner: R,
    converter: Arc<dyn ReferenceConverter>,
    cache: Arc<C>,
    config: CacheConfig,
    keys: CacheKeyScheme,
}

impl<R, C> CachedContentTypeResolver<R, C>
where
    R: ContentTypeResolver,
    C: CacheStore<ContentTypeDescriptor>,
{
    /// Create a cached resolver.
    ///
    /// # Errors
    ///
    /// Returns a config error if `config` does not validate.
    pub fn new(
        inner: R,
        converter: Arc<dyn ReferenceConverter>,
        cache: Arc<C>,
        config: CacheConfig,
    ) -> CatypeResult<Self> {
        config.validate()?;
        let keys = CacheKeyScheme::from_config(&config);
        Ok(Self {
            inner,
            converter,
            cache,
            config,
            keys,
        })
    }

    /// Create a cached resolver with default configuration.
    pub fn with_defaults(
        inner: R,
        converter: Arc<dyn ReferenceConverter>,
        cache: Arc<C>,
    ) -> Self {
        let config = CacheConfig::default();
        let keys = CacheKeyScheme::from_config(&config);
        Self {
            inner,
            converter,
            cache,
            config,
            keys,
        }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get the key scheme.
    pub fn keys(&self) -> &CacheKeyScheme {
        &self.keys
    }

    /// Get a reference to the cache store.
    pub fn backend(&self) -> &C {
        &self.cache
    }

    /// Get a reference to the wrapped resolver.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Cache key for a reference, or `None` when it is not catalog content.
    pub fn cache_key(&self, content_link: &ContentReference) -> Option<String> {
        let kind: ContentKind = self.converter.kind_of(content_link)?;
        let object_id = self.converter.object_id_of(content_link);
        Some(self.keys.entry_key(kind, object_id))
    }

    /// Eviction policy for a freshly resolved reference.
    pub fn eviction_policy(&self, content_link: &ContentReference) -> EvictionPolicy {
        EvictionPolicy::sliding(self.config.sliding_window)
            .with_dependency(self.keys.dependency_key(content_link))
            .with_dependency(self.keys.master_key())
    }

    /// Evict one reference through its per-item dependency key.
    pub fn invalidate(&self, content_link: &ContentReference) -> CatypeResult<u64> {
        self.cache.invalidate(&self.keys.dependency_key(content_link))
    }

    /// Evict everything this resolver cached.
    pub fn invalidate_all(&self) -> CatypeResult<u64> {
        self.cache.invalidate(&self.keys.master_key())
    }

    /// Split a batch into cached pairs and references still to resolve.
    fn probe(
        &self,
        content_links: &[ContentReference],
    ) -> (Vec<ResolvedContentType>, Vec<ContentReference>) {
        let mut seen = HashSet::with_capacity(content_links.len());
        let mut hits = Vec::new();
        let mut misses = Vec::new();

        for content_link in content_links {
            if !seen.insert(*content_link) {
                continue;
            }

            let Some(key) = self.cache_key(content_link) else {
                misses.push(*content_link);
                continue;
            };

            match self.cache.get(&key) {
                Ok(Some(content_type)) => {
                    hits.push(ResolvedContentType::new(*content_link, content_type));
                }
                Ok(None) => misses.push(*content_link),
                Err(e) => {
                    tracing::warn!(error = %e, %key, "Cache probe failed, treating as miss");
                    misses.push(*content_link);
                }
            }
        }

        (hits, misses)
    }

    fn store(&self, resolved: &ResolvedContentType) {
        let Some(key) = self.cache_key(&resolved.content_link) else {
            return;
        };

        let policy = self.eviction_policy(&resolved.content_link);
        if let Err(e) = self
            .cache
            .insert(&key, resolved.content_type.clone(), policy)
        {
            tracing::warn!(error = %e, %key, "Cache insert failed");
        }
    }
}

impl<R, C> ContentTypeResolver for CachedContentTypeResolver<R, C>
where
    R: ContentTypeResolver,
    C: CacheStore<ContentTypeDescriptor>,
{
    fn resolve_content_types(
        &self,
        content_links: &[ContentReference],
    ) -> CatypeResult<Vec<ResolvedContentType>> {
        if !self.config.enabled {
            return self.inner.resolve_content_types(content_links);
        }

        let (mut result, misses) = self.probe(content_links);

        tracing::debug!(
            hits = result.len(),
            misses = misses.len(),
            "Probed content type cache"
        );

        if misses.is_empty() {
            return Ok(result);
        }

        let resolved = self.inner.resolve_content_types(&misses)?;
        for pair in &resolved {
            self.store(pair);
        }

        result.extend(resolved);
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

impl<R, C> Clone for CachedContentTypeResolver<R, C>
where
    R: ContentTypeResolver + Clone,
    C: CacheStore<ContentTypeDescriptor>,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            converter: Arc::clone(&self.converter),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
            keys: self.keys.clone(),
        }
    }
}
