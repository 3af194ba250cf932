//! Per-location snapshot slots
//!
//! Two entries per location share one retention TTL:
//! - `latest`: overwritten on every successful fetch
//! - `last_active`: overwritten only by snapshots with at least one alert

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::{LocationId, Snapshot};
use crate::cache::{CacheError, CacheStore, CacheStoreExt};

/// Default retention for both slots: 30 days
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 24 * 3600);

/// The stored slots for one location; either may be absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotPair {
    pub latest: Option<Snapshot>,
    pub last_active: Option<Snapshot>,
}

/// Persists `latest` and `last_active` snapshots in a cache store
#[derive(Clone)]
pub struct SnapshotStore {
    cache: Arc<dyn CacheStore>,
    retention: Duration,
}

impl SnapshotStore {
    pub fn new(cache: Arc<dyn CacheStore>, retention: Duration) -> Self {
        Self { cache, retention }
    }

    fn latest_key(id: &LocationId) -> String {
        format!("alerts_latest_{}", id)
    }

    fn last_active_key(id: &LocationId) -> String {
        format!("alerts_last_active_{}", id)
    }

    /// Reads both slots for `id`
    ///
    /// A stored `last_active` without alerts is reported as absent.
    pub fn get(&self, id: &LocationId) -> Result<SnapshotPair, CacheError> {
        Ok(SnapshotPair {
            latest: self.cache.get::<Snapshot>(&Self::latest_key(id))?,
            last_active: self.get_last_active(id)?,
        })
    }

    /// Reads only the `last_active` slot for `id`
    ///
    /// Independent of `latest`, so an unreadable `latest` entry does not hide
    /// the fallback snapshot.
    pub fn get_last_active(&self, id: &LocationId) -> Result<Option<Snapshot>, CacheError> {
        Ok(self
            .cache
            .get::<Snapshot>(&Self::last_active_key(id))?
            .filter(|snapshot| {
                if !snapshot.is_active() {
                    warn!(%id, "ignoring stored last-active snapshot without alerts");
                }
                snapshot.is_active()
            }))
    }

    /// Records a freshly fetched snapshot
    ///
    /// Always replaces `latest`; replaces `last_active` only if the snapshot has
    /// alerts. An empty snapshot never clears `last_active`. Both writes are
    /// attempted even if the first fails; the first error is returned.
    pub fn put(&self, id: &LocationId, snapshot: &Snapshot) -> Result<(), CacheError> {
        let latest = self
            .cache
            .set(&Self::latest_key(id), snapshot, Some(self.retention));
        let last_active = if snapshot.is_active() {
            self.cache
                .set(&Self::last_active_key(id), snapshot, Some(self.retention))
        } else {
            Ok(())
        };
        latest.and(last_active)
    }
}
