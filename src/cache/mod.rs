//! Key-value cache stores
//!
//! `CacheStore` is the narrow get/set-with-TTL primitive the alert pipeline is
//! written against. Two implementations ship with the crate: `CacheManager`
//! persists entries as JSON files on disk, `MemoryCache` keeps them in process.
//! Expired entries are reported as absent by `get_value`.

mod manager;
mod memory;

use std::future::Future;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub use manager::CacheManager;
pub use memory::MemoryCache;

/// Errors raised by a cache store
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing storage failed
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The entry could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The TTL does not fit in a timestamp
    #[error("TTL out of range")]
    InvalidTtl,
}

/// A key-value store with per-entry expiry
///
/// Each `get_value`/`set_value` call is atomic for its key. No multi-key
/// transactions are offered.
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if it is missing or expired
    fn get_value(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Stores `value` under `key`; `ttl = None` keeps the entry until overwritten
    fn set_value(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<(), CacheError>;
}

/// Typed access on top of any `CacheStore`
pub trait CacheStoreExt: CacheStore {
    /// Reads and deserializes the value stored under `key`
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_value(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serializes and stores `data` under `key`
    fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.set_value(key, &serde_json::to_value(data)?, ttl)
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}

/// Returns the cached value for `key`, computing and caching it on a miss
///
/// Errors from `compute` are returned to the caller and nothing is cached.
/// Cache read and write failures are logged and otherwise ignored: a broken
/// cache degrades to calling `compute` every time.
pub async fn try_get<S, T, E, F, Fut>(
    store: &S,
    key: &str,
    ttl: Option<Duration>,
    compute: F,
) -> Result<T, E>
where
    S: CacheStore + ?Sized,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match store.get::<T>(key) {
        Ok(Some(hit)) => {
            debug!(key, "cache hit");
            return Ok(hit);
        }
        Ok(None) => debug!(key, "cache miss"),
        Err(e) => warn!(key, error = %e, "cache read failed, recomputing"),
    }

    let value = compute().await?;

    if let Err(e) = store.set(key, &value, ttl) {
        warn!(key, error = %e, "cache write failed");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_try_get_computes_once_then_serves_from_cache() {
        let cache = MemoryCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<String, String> = try_get(&cache, "k", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("computed".to_string())
            })
            .await;
            assert_eq!(value.unwrap(), "computed");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_try_get_does_not_cache_errors() {
        let cache = MemoryCache::new();

        let first: Result<u32, &str> = try_get(&cache, "k", None, || async { Err("boom") }).await;
        assert_eq!(first, Err("boom"));
        assert!(cache.get::<u32>("k").unwrap().is_none());

        let second: Result<u32, &str> = try_get(&cache, "k", None, || async { Ok(7) }).await;
        assert_eq!(second, Ok(7));
        assert_eq!(cache.get::<u32>("k").unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_try_get_recomputes_after_expiry() {
        let cache = MemoryCache::new();
        cache.set("k", &1u32, Some(Duration::ZERO)).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let value: Result<u32, ()> = try_get(&cache, "k", None, || async { Ok(2) }).await;
        assert_eq!(value, Ok(2));
    }

    #[test]
    fn test_typed_helpers_work_through_trait_objects() {
        let store: std::sync::Arc<dyn CacheStore> = std::sync::Arc::new(MemoryCache::new());

        store.set("pair", &(1, "one"), None).unwrap();

        let back: Option<(i32, String)> = store.get("pair").unwrap();
        assert_eq!(back, Some((1, "one".to_string())));
    }
}
