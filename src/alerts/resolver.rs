//! Location string to upstream location id

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::{LocationId, LocationQuery};
use crate::api::{ApiError, WeatherApi, CODE_OK};
use crate::cache::{self, CacheStore};

/// Status code the geocoding API returns when nothing matched
const CODE_NOT_FOUND: &str = "404";

/// Errors that can occur when resolving a location
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The query was empty or whitespace
    #[error("Location not recognized: empty location")]
    EmptyQuery,

    /// The geocoding request itself failed
    #[error("Location lookup failed: {0}")]
    Lookup(#[from] ApiError),

    /// The geocoding API answered with an error status in the body
    #[error("Location lookup failed with upstream code {code}")]
    Upstream { code: String },

    /// The geocoding API returned zero candidates
    #[error("Location not recognized: '{0}'")]
    NoCandidates(String),
}

/// Resolves user-entered locations to upstream ids, caching results forever
#[derive(Clone)]
pub struct LocationResolver {
    api: Arc<dyn WeatherApi>,
    cache: Arc<dyn CacheStore>,
}

impl LocationResolver {
    pub fn new(api: Arc<dyn WeatherApi>, cache: Arc<dyn CacheStore>) -> Self {
        Self { api, cache }
    }

    /// Generates a cache key for a location query
    fn cache_key(query: &LocationQuery) -> String {
        format!("location_id_{}", query.as_str())
    }

    /// Resolves `query` to a location id
    ///
    /// The first candidate in upstream order wins. A successful result is cached
    /// under the literal query with no expiry, so later calls for the same string
    /// make no network request. Failures are not cached.
    pub async fn resolve(&self, query: &LocationQuery) -> Result<LocationId, ResolutionError> {
        if query.as_str().trim().is_empty() {
            return Err(ResolutionError::EmptyQuery);
        }

        cache::try_get(self.cache.as_ref(), &Self::cache_key(query), None, || {
            self.lookup(query)
        })
        .await
    }

    async fn lookup(&self, query: &LocationQuery) -> Result<LocationId, ResolutionError> {
        let response = self.api.lookup_city(query.as_str()).await?;

        if response.code == CODE_NOT_FOUND {
            return Err(ResolutionError::NoCandidates(query.to_string()));
        }
        if response.code != CODE_OK {
            return Err(ResolutionError::Upstream {
                code: response.code,
            });
        }

        let first = response
            .location
            .into_iter()
            .next()
            .ok_or_else(|| ResolutionError::NoCandidates(query.to_string()))?;

        debug!(%query, id = %first.id, name = %first.name, "resolved location");
        Ok(LocationId::new(first.id))
    }
}
