//! Object storage cache store.
//!
//! Entries live in a bucket under a prefix, addressed with a `gs://bucket/prefix`
//! URI and accessed through the Cloud Storage JSON API. Value and write stamp
//! travel together in a small JSON envelope, so freshness needs no metadata
//! call. Writers never coordinate: the last upload wins.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use jiff::{SignedDuration, Timestamp};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::cache::{CacheEntry, CacheError, CacheKey, CacheStore};
use crate::config::settings::{RemoteAuth, RemoteCacheConfig};

/// URI scheme accepted for remote cache locations.
pub const REMOTE_SCHEME: &str = "gs";

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before the server says they expire.
const TOKEN_REFRESH_MARGIN: SignedDuration = SignedDuration::from_secs(60);

/// Bucket and object prefix parsed from `gs://bucket/prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    pub bucket: String,
    pub prefix: String,
}

impl RemoteLocation {
    /// Whether `location` names a remote store rather than a local path.
    pub fn is_remote(location: &str) -> bool {
        location.starts_with(&format!("{}://", REMOTE_SCHEME))
    }

    pub fn parse(location: &str) -> Result<Self, CacheError> {
        let url = Url::parse(location)
            .map_err(|e| CacheError::InvalidLocation(format!("{}: {}", location, e)))?;

        if url.scheme() != REMOTE_SCHEME {
            return Err(CacheError::InvalidLocation(format!(
                "{}: expected {}:// scheme",
                location, REMOTE_SCHEME
            )));
        }

        let bucket = url
            .host_str()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| CacheError::InvalidLocation(format!("{}: missing bucket", location)))?
            .to_string();

        let prefix = url.path().trim_matches('/').to_string();

        Ok(Self { bucket, prefix })
    }

    /// Full object name for `key` inside the bucket.
    pub fn object_name(&self, key: &CacheKey) -> String {
        if self.prefix.is_empty() {
            key.object_path()
        } else {
            format!("{}/{}", self.prefix, key.object_path())
        }
    }
}

/// On-the-wire form of a remote entry.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    stored_at: Timestamp,
    value: String,
}

impl Envelope {
    fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            stored_at: entry.stored_at,
            value: BASE64.encode(&entry.value),
        }
    }

    fn into_entry(self) -> Result<CacheEntry, CacheError> {
        let value = BASE64
            .decode(self.value.as_bytes())
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        Ok(CacheEntry::new(value, self.stored_at))
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Timestamp,
}

/// Where bearer tokens for the storage API come from.
enum TokenSource {
    Anonymous,
    Static(String),
    Metadata {
        url: String,
        cached: Mutex<Option<CachedToken>>,
    },
}

impl TokenSource {
    async fn token(&self, client: &Client) -> Result<Option<String>, CacheError> {
        match self {
            TokenSource::Anonymous => Ok(None),
            TokenSource::Static(token) => Ok(Some(token.clone())),
            TokenSource::Metadata { url, cached } => {
                let mut guard = cached.lock().await;
                if let Some(token) = guard.as_ref()
                    && Timestamp::now() < token.refresh_at
                {
                    return Ok(Some(token.value.clone()));
                }

                let response = client
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?
                    .error_for_status()
                    .map_err(|e| CacheError::Connection(format!("metadata token: {}", e)))?;
                let token: MetadataToken = response.json().await?;

                let lifetime = SignedDuration::from_secs(token.expires_in);
                let refresh_at = Timestamp::now()
                    .checked_add(lifetime - TOKEN_REFRESH_MARGIN)
                    .unwrap_or_else(|_| Timestamp::now());

                *guard = Some(CachedToken {
                    value: token.access_token.clone(),
                    refresh_at,
                });
                Ok(Some(token.access_token))
            }
        }
    }
}

/// Cloud Storage backed store, shared by every instance pointing at the same
/// bucket and prefix.
pub struct RemoteStore {
    client: Client,
    endpoint: Url,
    location: RemoteLocation,
    tokens: TokenSource,
}

impl RemoteStore {
    pub fn new(location: &str, config: &RemoteCacheConfig) -> Result<Self, CacheError> {
        let location = RemoteLocation::parse(location)?;

        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            CacheError::InvalidLocation(format!("endpoint {}: {}", config.endpoint, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .build()
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let tokens = match config.auth {
            RemoteAuth::None => TokenSource::Anonymous,
            RemoteAuth::Token => TokenSource::Static(config.access_token.clone()),
            RemoteAuth::Metadata => TokenSource::Metadata {
                url: METADATA_TOKEN_URL.to_string(),
                cached: Mutex::new(None),
            },
        };

        Ok(Self {
            client,
            endpoint,
            location,
            tokens,
        })
    }

    pub fn location(&self) -> &RemoteLocation {
        &self.location
    }

    fn download_url(&self, object: &str) -> Result<Url, CacheError> {
        let mut url = self.api_url(&format!(
            "storage/v1/b/{}/o/{}",
            urlencoding::encode(&self.location.bucket),
            urlencoding::encode(object)
        ))?;
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    fn upload_url(&self, object: &str) -> Result<Url, CacheError> {
        let mut url = self.api_url(&format!(
            "upload/storage/v1/b/{}/o",
            urlencoding::encode(&self.location.bucket)
        ))?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", object);
        Ok(url)
    }

    fn api_url(&self, path: &str) -> Result<Url, CacheError> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| CacheError::InvalidLocation(e.to_string()))
    }

    async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, CacheError> {
        Ok(match self.tokens.token(&self.client).await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }
}

#[async_trait]
impl CacheStore for RemoteStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let object = self.location.object_name(key);
        let request = self.authorize(self.client.get(self.download_url(&object)?)).await?;
        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = response.bytes().await?;
                let envelope: Envelope = serde_json::from_slice(&bytes)?;
                envelope.into_entry().map(Some)
            }
            status => Err(CacheError::Operation(format!(
                "GET {} returned {}",
                object, status
            ))),
        }
    }

    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        let object = self.location.object_name(key);
        let body = serde_json::to_vec(&Envelope::from_entry(entry))?;

        let request = self
            .client
            .post(self.upload_url(&object)?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        let response = self.authorize(request).await?.send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(CacheError::Operation(format!(
                "upload {} returned {}",
                object, status
            )))
        }
    }
}
