//! Disk-backed cache store
//!
//! Provides a `CacheManager` that stores serializable data to JSON files with
//! optional expiry timestamps. Entries written without a TTL never expire.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{CacheError, CacheStore};

/// Distinguishes temp files written concurrently by the same process
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// The cached data
    data: T,
    /// When the data was cached
    cached_at: DateTime<Utc>,
    /// When the cache entry expires, `None` for entries that never expire
    expires_at: Option<DateTime<Utc>>,
}

/// Result of reading from cache, including whether the entry has expired
#[derive(Debug)]
pub(crate) struct CachedData<T> {
    pub(crate) data: T,
    pub(crate) is_expired: bool,
}

/// Manages reading and writing cached data to disk
///
/// The cache manager stores data as JSON files in an XDG-compliant cache directory
/// (`~/.cache/qwalert/` on Linux). Keys are escaped into safe file names, so any
/// literal string (including non-ASCII location names) can be used as a key.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "qwalert")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Returns the directory cache files are written to
    pub fn dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    /// Returns the path to a cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", file_stem(key)))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Writes data to the cache with an optional TTL
    ///
    /// The entry is written to a temporary file and renamed into place, so a
    /// concurrent reader sees either the previous entry or the new one.
    ///
    /// # Arguments
    /// * `key` - Unique identifier for the cache entry (e.g., "location_id_Beijing")
    /// * `data` - The data to cache (must implement Serialize)
    /// * `ttl` - How long the entry stays valid, `None` to keep it forever
    pub fn write<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.ensure_dir()?;

        let now = Utc::now();
        let expires_at = match ttl {
            Some(ttl) => {
                let ttl = chrono::Duration::from_std(ttl).map_err(|_| CacheError::InvalidTtl)?;
                Some(now.checked_add_signed(ttl).ok_or(CacheError::InvalidTtl)?)
            }
            None => None,
        };
        let entry = CacheEntry {
            data,
            cached_at: now,
            expires_at,
        };

        let json = serde_json::to_string_pretty(&entry)?;

        let path = self.cache_path(key);
        let tmp = path.with_extension(format!(
            "{}.{}.tmp",
            std::process::id(),
            WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Reads data from the cache
    ///
    /// Returns `Ok(None)` if the cache entry doesn't exist. Expired entries are
    /// still returned with `is_expired = true`; `CacheStore::get_value` is the
    /// view that hides and removes them. An entry expires once `now` reaches
    /// its `expires_at`.
    pub(crate) fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedData<T>>, CacheError> {
        let content = match fs::read_to_string(self.cache_path(key)) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: CacheEntry<T> = serde_json::from_str(&content)?;

        let is_expired = entry
            .expires_at
            .map(|expires_at| Utc::now() >= expires_at)
            .unwrap_or(false);

        Ok(Some(CachedData {
            data: entry.data,
            is_expired,
        }))
    }

    /// Deletes the entry for `key`; a missing file is not an error
    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.cache_path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

impl CacheStore for CacheManager {
    fn get_value(&self, key: &str) -> Result<Option<Value>, CacheError> {
        match self.read::<Value>(key)? {
            Some(cached) if cached.is_expired => {
                debug!(key, "removing expired cache entry");
                self.remove(key)?;
                Ok(None)
            }
            Some(cached) => Ok(Some(cached.data)),
            None => Ok(None),
        }
    }

    fn set_value(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.write(key, value, ttl)
    }
}

/// Escapes a key into a file name: ASCII punctuation, path separators and
/// whitespace become `%XX` per UTF-8 byte, alphanumerics (any script) are kept.
fn file_stem(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}
