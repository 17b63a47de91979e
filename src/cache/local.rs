//! Local directory cache store.
//!
//! One file per key under a scratch directory. The file body is the raw
//! payload and the file modification time is the write stamp, so an entry
//! can be judged without reading a separate metadata record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use filetime::FileTime;
use jiff::Timestamp;
use tokio::fs;

use crate::cache::{CacheEntry, CacheError, CacheKey, CacheStore};

/// File-per-key store, scoped to a single execution environment.
pub struct LocalStore {
    directory: PathBuf,
}

impl LocalStore {
    /// Create the store, making sure `directory` exists.
    pub async fn new(directory: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).await.map_err(|e| {
            CacheError::InvalidLocation(format!(
                "cannot create cache directory {}: {}",
                directory.display(),
                e
            ))
        })?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.directory.join(format!("{}.json", key.digest()))
    }

    fn temp_path(&self, key: &CacheKey) -> PathBuf {
        self.directory
            .join(format!(".{}.{:016x}.tmp", key.digest(), rand::random::<u64>()))
    }
}

#[async_trait]
impl CacheStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(key);

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let modified = metadata.modified()?;
        let stored_at = Timestamp::try_from(modified)
            .map_err(|e| CacheError::Operation(format!("bad mtime on {}: {}", path.display(), e)))?;

        let value = match fs::read(&path).await {
            Ok(value) => value,
            // Lost a race with a concurrent replace; nothing to serve.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(CacheEntry::new(value, stored_at)))
    }

    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let temp = self.temp_path(key);

        write_or_discard(&temp, &entry.value).await?;

        let mtime = FileTime::from_system_time(SystemTime::from(entry.stored_at));
        let stamp_target = temp.clone();
        let stamped = tokio::task::spawn_blocking(move || {
            filetime::set_file_mtime(&stamp_target, mtime)
        })
        .await
        .map_err(|e| CacheError::Operation(e.to_string()))?;

        if let Err(e) = stamped {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        Ok(())
    }
}

/// Write `bytes` to `path`, removing whatever was created if the write fails.
async fn write_or_discard(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    if let Err(e) = fs::write(path, bytes).await {
        let _ = fs::remove_file(path).await;
        return Err(e.into());
    }
    Ok(())
}
