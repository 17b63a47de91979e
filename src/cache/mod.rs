//! TTL cache in front of slow upstream lookups.
//!
//! Two interchangeable stores implement [`CacheStore`]:
//! - [`LocalStore`]: one file per key in a local directory, stamped by mtime
//! - [`RemoteStore`]: one object per key in a `gs://bucket/prefix` location
//!
//! A [`NoOpStore`] stands in when caching is disabled. The store is chosen
//! from `cache.dir` at startup by [`CacheManager::new`].
//!
//! # Configuration
//!
//! ```toml
//! [cache]
//! dir = ".cache"            # or "gs://bucket/prefix"
//! ttl_seconds = 3600        # 0 disables caching
//! disabled = false
//!
//! [cache.remote]
//! auth = "metadata"         # "none" | "token" | "metadata"
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let info = cache
//!     .resolve(&CacheKey::ticker_info("AAPL"), || provider.get_info(&ticker))
//!     .await?;
//! ```

mod entry;
mod error;
mod key;
mod local;
mod manager;
mod noop;
mod remote;
mod resolver;
mod traits;

pub use entry::{CacheEntry, Clock, SystemClock};
pub use error::CacheError;
pub use key::{CacheKey, TICKER_INFO_NAMESPACE};
pub use local::LocalStore;
pub use manager::CacheManager;
pub use noop::NoOpStore;
pub use remote::{REMOTE_SCHEME, RemoteLocation, RemoteStore};
pub use resolver::resolve;
pub use traits::CacheStore;

pub use crate::config::settings::{CacheConfig, RemoteAuth, RemoteCacheConfig};
