//! Freshness policy: which snapshot to present, and what to remember
//!
//! A successful fetch is always presented as-is, even when it has no alerts:
//! "confirmed calm" beats stale data. Only when the fetch itself fails does the
//! policy fall back to the last snapshot that had alerts. With nothing to fall
//! back to it reports that no data is available instead of failing.

use tracing::{info, warn};

use super::{
    AlertFetcher, LocationId, LocationQuery, LocationResolver, ResolutionError, Snapshot,
    SnapshotStore,
};

/// The snapshot chosen for presentation
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Fresh snapshot from a successful fetch (may be empty)
    Current(Snapshot),
    /// Upstream unavailable; last snapshot that had alerts
    Fallback(Snapshot),
    /// Upstream unavailable and nothing to fall back to
    NoData,
}

impl Decision {
    /// The snapshot to render, if any
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Decision::Current(s) | Decision::Fallback(s) => Some(s),
            Decision::NoData => None,
        }
    }

    /// Whether the presented data is stale fallback data
    pub fn is_fallback(&self) -> bool {
        matches!(self, Decision::Fallback(_))
    }
}

/// Decides what to present for a location and keeps the snapshot store current
#[derive(Clone)]
pub struct FreshnessPolicy {
    resolver: LocationResolver,
    fetcher: AlertFetcher,
    store: SnapshotStore,
}

impl FreshnessPolicy {
    pub fn new(resolver: LocationResolver, fetcher: AlertFetcher, store: SnapshotStore) -> Self {
        Self {
            resolver,
            fetcher,
            store,
        }
    }

    /// Fetch, update the store and choose the snapshot to present
    ///
    /// # Returns
    /// * `Ok(Decision)` - for every outcome of the alert fetch
    /// * `Err(ResolutionError)` - if the location cannot be resolved; without an
    ///   id there is nothing to fall back to
    pub async fn decide(&self, query: &LocationQuery) -> Result<Decision, ResolutionError> {
        let id = self.resolver.resolve(query).await?;
        Ok(self.decide_for(&id).await)
    }

    /// Same as `decide` for an already resolved location
    pub async fn decide_for(&self, id: &LocationId) -> Decision {
        match self.fetcher.fetch(id).await {
            Ok(snapshot) => {
                if let Err(e) = self.store.put(id, &snapshot) {
                    warn!(%id, error = %e, "failed to store alert snapshot");
                }
                Decision::Current(snapshot)
            }
            Err(fetch_error) => {
                warn!(%id, error = %fetch_error, "alert fetch failed");
                let last_active = self.store.get_last_active(id).unwrap_or_else(|e| {
                    warn!(%id, error = %e, "failed to read last active snapshot");
                    None
                });
                match last_active {
                    Some(snapshot) => {
                        info!(%id, "serving last known alerts");
                        Decision::Fallback(snapshot)
                    }
                    None => {
                        info!(%id, "no alert data available");
                        Decision::NoData
                    }
                }
            }
        }
    }
}
