//! Cache layer
//!
//! Caches CMS query results so a page render does not hit the content API on
//! every request. Entries expire after `cache.ttl_seconds`, which gives the
//! same freshness guarantees as periodic regeneration.
//!
//! # Usage
//!
//! ```rust,ignore
//! use almas::cache::{create_cache, CacheLayer};
//! use almas::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("posts:all", &posts, Duration::from_secs(60)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// Generic over the stored value, so implementations are used through their
/// concrete type rather than as `dyn CacheLayer`.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;
}

/// Create the content cache from configuration
///
/// Returns `None` when caching is disabled.
pub fn create_cache(config: &CacheConfig) -> Option<Arc<MemoryCache>> {
    if !config.enabled {
        tracing::info!("Content cache disabled");
        return None;
    }

    tracing::info!(
        "Using in-memory content cache (capacity {}, ttl {}s)",
        config.max_capacity,
        config.ttl_seconds
    );
    Some(Arc::new(MemoryCache::with_capacity_and_ttl(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    )))
}
