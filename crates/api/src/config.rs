//! Backend connection settings.

use std::time::Duration;

use url::Url;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default lifetime of cached catalog and settings responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Connection settings for [`crate::ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend origin, e.g. `https://api.printloom.example`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Cache lifetime; zero disables the cache.
    pub cache_ttl: Duration,
}

impl ApiConfig {
    /// Settings with default timeout and cache lifetime.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the cache lifetime.
    #[must_use]
    pub const fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }
}
