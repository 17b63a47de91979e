//! CacheStore trait definition.

use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;

use crate::cache::{CacheEntry, CacheError, CacheKey};

/// Trait for cache storage backends.
///
/// Backends report their failures; it is the resolver's job to degrade a
/// failed read to a miss and to ignore a failed write.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend label used in logs and health output.
    fn name(&self) -> &'static str;

    /// Read an entry. A missing key is `Ok(None)`, never an error.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    /// Write an entry, replacing whatever was stored under `key`.
    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Whether `entry` is still usable at `now`.
    fn is_fresh(&self, entry: &CacheEntry, ttl: Duration, now: Timestamp) -> bool {
        entry.is_fresh(ttl, now)
    }
}
