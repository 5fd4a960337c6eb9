use std::time::Duration;

/// The default upper bound for the aggregate number of cached bindings.
pub const DEFAULT_CACHE_MAX_SIZE: usize = 500;

/// The default time a committed entry stays in the cache.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(20 * 60);

/// Configures the bounds of a [BgpCache](crate::BgpCache).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// The maximum sum of the binding counts of all entries.
    pub max_size: usize,
    /// How long a committed entry is kept, counted from its commit.
    pub ttl: Duration,
}

impl CacheConfig {
    #[must_use]
    pub fn with_max_size(self, max_size: usize) -> Self {
        Self { max_size, ..self }
    }

    #[must_use]
    pub fn with_ttl(self, ttl: Duration) -> Self {
        Self { ttl, ..self }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_CACHE_MAX_SIZE,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}
