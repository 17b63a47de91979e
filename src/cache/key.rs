//! Cache key type.

use std::fmt;

use sha2::{Digest, Sha256};

/// Namespace for ticker info records.
pub const TICKER_INFO_NAMESPACE: &str = "ticker_info";

/// Identifies one cached item.
///
/// The id is normalized to uppercase so `aapl` and `AAPL` share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    id: String,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>, id: impl AsRef<str>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.as_ref().trim().to_uppercase(),
        }
    }

    /// Key for a ticker info record.
    pub fn ticker_info(symbol: &str) -> Self {
        Self::new(TICKER_INFO_NAMESPACE, symbol)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// SHA-256 hex digest of the canonical text form. Safe as a file name.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Relative object path, `{namespace}/{id}.json`.
    pub fn object_path(&self) -> String {
        format!("{}/{}.json", self.namespace, self.id)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.id)
    }
}
