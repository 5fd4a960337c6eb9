use rdf_weave_cache::BgpCache;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The number of bindings that a bound join sends to the store in a single request.
pub const DEFAULT_BOUND_JOIN_BUCKET_SIZE: usize = 15;

/// Settings of a single execution that influence how operators evaluate their input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextProperties {
    /// Overrides [DEFAULT_BOUND_JOIN_BUCKET_SIZE].
    pub bound_join_bucket_size: Option<usize>,
    /// Evaluates BGPs with index joins even if the store supports union evaluation.
    pub force_index_join: bool,
    /// Whether the query restricts its solutions with `LIMIT` or `OFFSET`. Such executions may
    /// stop early and therefore never populate the cache.
    pub has_limit_or_offset: bool,
    /// Additional settings for store implementations.
    pub extra: BTreeMap<String, String>,
}

impl ContextProperties {
    /// Returns the bound join bucket size, which is always at least one.
    pub fn bucket_size(&self) -> usize {
        self.bound_join_bucket_size
            .unwrap_or(DEFAULT_BOUND_JOIN_BUCKET_SIZE)
            .max(1)
    }

    #[must_use]
    pub fn with_bound_join_bucket_size(mut self, size: usize) -> Self {
        self.bound_join_bucket_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_force_index_join(mut self, force: bool) -> Self {
        self.force_index_join = force;
        self
    }

    #[must_use]
    pub fn with_limit_or_offset(mut self, has_limit_or_offset: bool) -> Self {
        self.has_limit_or_offset = has_limit_or_offset;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Everything an operator needs to know about the current execution besides its input.
///
/// The context is cheap to clone. All clones share the same cache.
#[derive(Clone, Debug, Default)]
pub struct ExecutionContext {
    cache: Option<Arc<BgpCache>>,
    properties: ContextProperties,
}

impl ExecutionContext {
    /// Creates a context without a cache and with default properties.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<BgpCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: ContextProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Returns the cache, or [None] if caching is disabled for this execution.
    pub fn cache(&self) -> Option<&Arc<BgpCache>> {
        self.cache.as_ref()
    }

    pub fn properties(&self) -> &ContextProperties {
        &self.properties
    }

    /// Returns a copy of this context with the given change applied to the properties.
    #[must_use]
    pub fn map_properties(&self, f: impl FnOnce(ContextProperties) -> ContextProperties) -> Self {
        Self {
            cache: self.cache.clone(),
            properties: f(self.properties.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_size_defaults_and_overrides() {
        let properties = ContextProperties::default();
        assert_eq!(properties.bucket_size(), DEFAULT_BOUND_JOIN_BUCKET_SIZE);
        assert_eq!(properties.clone().with_bound_join_bucket_size(1).bucket_size(), 1);
        assert_eq!(properties.with_bound_join_bucket_size(0).bucket_size(), 1);
    }

    #[test]
    fn derived_contexts_share_the_cache() {
        let cache = Arc::new(BgpCache::default());
        let context = ExecutionContext::new().with_cache(Arc::clone(&cache));

        let forced = context.map_properties(|p| p.with_force_index_join(true));

        assert!(forced.properties().force_index_join);
        assert!(!context.properties().force_index_join);
        assert!(Arc::ptr_eq(forced.cache().unwrap(), &cache));
        assert!(forced.without_cache().cache().is_none());
    }
}
