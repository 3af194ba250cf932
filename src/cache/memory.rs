//! In-process cache store

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

use super::{CacheError, CacheStore};

/// A `CacheStore` backed by a mutex-guarded `HashMap`
///
/// Used by `--memory-cache` runs and throughout the tests. Expired entries are
/// dropped lazily on read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Value, Option<Instant>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .values()
            .filter(|(_, expires_at)| expires_at.map_or(true, |at| at > now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (Value, Option<Instant>)>> {
        // A panic while holding the lock cannot leave a half-written entry behind
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for MemoryCache {
    fn get_value(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            None => return Ok(None),
            Some((_, Some(expires_at))) => Instant::now() >= *expires_at,
            Some((_, None)) => false,
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    fn set_value(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = match ttl {
            Some(ttl) => Some(Instant::now().checked_add(ttl).ok_or(CacheError::InvalidTtl)?),
            None => None,
        };
        self.lock().insert(key.to_string(), (value.clone(), expires_at));
        Ok(())
    }
}
