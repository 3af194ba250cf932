//! Wires the alert pipeline together
//!
//! `AlertFeedService` owns one `FreshnessPolicy` built from explicit
//! collaborators and turns location queries into feeds.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use crate::alerts::{
    present, AlertFetcher, Feed, FreshnessPolicy, LocationQuery, LocationResolver,
    ResolutionError, SnapshotStore,
};
use crate::api::{ApiError, QWeatherClient, WeatherApi};
use crate::cache::{CacheManager, CacheStore, MemoryCache};
use crate::config::{CacheLocation, Config};

/// Produces alert feeds for locations
#[derive(Clone)]
pub struct AlertFeedService {
    policy: FreshnessPolicy,
}

impl AlertFeedService {
    /// Create a service over the given upstream API and cache store
    ///
    /// The same store holds resolved location ids (no expiry) and alert
    /// snapshots (kept for `retention`).
    pub fn new(api: Arc<dyn WeatherApi>, cache: Arc<dyn CacheStore>, retention: Duration) -> Self {
        let policy = FreshnessPolicy::new(
            LocationResolver::new(api.clone(), cache.clone()),
            AlertFetcher::new(api),
            SnapshotStore::new(cache, retention),
        );
        Self { policy }
    }

    /// Create a service talking to QWeather with the configured cache
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let api = QWeatherClient::new(config.api_key.clone(), config.timeout)?
            .with_geo_base_url(config.geo_base_url.clone())
            .with_alert_base_url(config.alert_base_url.clone())
            .with_lang(config.lang.clone());

        Ok(Self::new(Arc::new(api), open_cache(&config.cache), config.retention))
    }

    /// Build the feed for one location
    ///
    /// Upstream alert failures never surface here; they degrade to fallback or
    /// placeholder feeds. Only an unresolvable location is an error.
    pub async fn feed(&self, query: &LocationQuery) -> Result<Feed, ResolutionError> {
        let decision = self.policy.decide(query).await?;
        Ok(present(&decision, query))
    }

    /// Build feeds for several locations concurrently, in input order
    pub async fn feeds(&self, queries: &[LocationQuery]) -> Vec<Result<Feed, ResolutionError>> {
        join_all(queries.iter().map(|query| self.feed(query))).await
    }
}

/// Open the configured cache store, falling back to memory when no cache
/// directory can be determined
fn open_cache(location: &CacheLocation) -> Arc<dyn CacheStore> {
    match location {
        CacheLocation::Memory => Arc::new(MemoryCache::new()),
        CacheLocation::Disk(Some(dir)) => Arc::new(CacheManager::with_dir(dir.clone())),
        CacheLocation::Disk(None) => match CacheManager::new() {
            Some(manager) => {
                info!(dir = %manager.dir().display(), "using disk cache");
                Arc::new(manager)
            }
            None => {
                warn!("no cache directory available, caching in memory only");
                Arc::new(MemoryCache::new())
            }
        },
    }
}
