//! NoOp cache store.
//!
//! Used when caching is disabled. All operations are no-ops.

use async_trait::async_trait;

use crate::cache::{CacheEntry, CacheError, CacheKey, CacheStore};

/// A store that never holds anything.
///
/// Used when `cache.disabled = true` or `cache.ttl_seconds = 0`.
pub struct NoOpStore;

impl NoOpStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for NoOpStore {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn get(&self, _key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        Ok(None)
    }

    async fn put(&self, _key: &CacheKey, _entry: &CacheEntry) -> Result<(), CacheError> {
        Ok(())
    }
}
