//! Core alert data models and pipeline
//!
//! The pipeline runs leaves first: `resolver` turns a location string into an
//! upstream id, `fetcher` pulls the current snapshot, `store` keeps the
//! `latest` and `last_active` snapshots per location, `policy` decides which
//! snapshot to show and `presenter` renders it as a feed.

pub mod fetcher;
pub mod policy;
pub mod presenter;
pub mod resolver;
pub mod store;

pub use fetcher::{AlertFetcher, FetchError};
pub use policy::{Decision, FreshnessPolicy};
pub use presenter::{present, present_unresolved, Feed, FeedItem};
pub use resolver::{LocationResolver, ResolutionError};
pub use store::{SnapshotPair, SnapshotStore};

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// A location as typed by the user, e.g. `广州` or `Beijing`
///
/// Resolution results are cached by the literal string, so `Beijing` and
/// `beijing` are resolved (and cached) separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationQuery(String);

impl LocationQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self(query.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upstream-assigned location identifier (e.g. `101280101`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single weather hazard alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Headline, e.g. "Typhoon Warning"
    pub title: String,
    /// Free-text body of the alert
    pub description: String,
    /// When the issuing office published the alert
    pub pub_time: DateTime<FixedOffset>,
    /// Upstream alert id
    #[serde(default)]
    pub id: Option<String>,
    /// Issuing office
    #[serde(default)]
    pub sender: Option<String>,
    /// Severity label (`Minor`, `Moderate`, `Severe`, ...)
    #[serde(default)]
    pub severity: Option<String>,
    /// Hazard type, e.g. "Rainstorm"
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub end_time: Option<DateTime<FixedOffset>>,
}

/// One upstream alert lookup for a location at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Active alerts; empty means the upstream confirmed there are none
    pub alerts: Vec<AlertRecord>,
    /// Link to the upstream detail page, shared by all alerts
    pub link: Option<String>,
    /// Upstream data update time, when provided
    pub updated_at: Option<DateTime<FixedOffset>>,
    /// When this snapshot was fetched
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Whether the snapshot carries at least one alert
    pub fn is_active(&self) -> bool {
        !self.alerts.is_empty()
    }
}

/// What is known about one snapshot slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    /// Nothing stored (never fetched, or expired)
    Absent,
    /// Stored with zero alerts
    Empty,
    /// Stored with at least one alert
    Active,
}

impl SnapshotState {
    pub fn of(snapshot: Option<&Snapshot>) -> Self {
        match snapshot {
            None => SnapshotState::Absent,
            Some(s) if s.is_active() => SnapshotState::Active,
            Some(_) => SnapshotState::Empty,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Builders shared by the pipeline unit tests

    use super::*;
    use crate::api::{
        ApiError, CityCandidate, CityLookupResponse, WarningNowResponse, WarningRecord,
        WeatherApi, CODE_OK,
    };
    use crate::cache::{CacheError, CacheStore};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    pub fn record(title: &str) -> AlertRecord {
        AlertRecord {
            title: title.to_string(),
            description: format!("{} in effect", title),
            pub_time: DateTime::parse_from_rfc3339("2024-09-15T08:00:00+08:00").unwrap(),
            id: None,
            sender: None,
            severity: None,
            type_name: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn snapshot(titles: &[&str]) -> Snapshot {
        Snapshot {
            alerts: titles.iter().map(|t| record(t)).collect(),
            link: Some("https://www.qweather.com/severe-weather/city-x-101.html".to_string()),
            updated_at: None,
            fetched_at: Utc::now(),
        }
    }

    /// Upstream double: every lookup resolves to `101`, warning answers are
    /// replayed in order (a network error once the script runs out)
    #[derive(Default)]
    pub struct ScriptedApi {
        warnings: Mutex<VecDeque<Result<WarningNowResponse, ApiError>>>,
        pub lookups: AtomicUsize,
        pub fetches: AtomicUsize,
    }

    impl ScriptedApi {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Queue a successful answer with the given warning titles
        pub fn then_alerts(&self, titles: &[&str]) -> &Self {
            let warning = titles
                .iter()
                .map(|title| WarningRecord {
                    title: title.to_string(),
                    text: format!("{} in effect", title),
                    pub_time: "2024-09-15T08:00+08:00".to_string(),
                    ..Default::default()
                })
                .collect();
            self.push(Ok(WarningNowResponse {
                code: CODE_OK.to_string(),
                update_time: Some("2024-09-15T08:20+08:00".to_string()),
                fx_link: Some("https://www.qweather.com/severe-weather/city-x-101.html".to_string()),
                warning,
            }))
        }

        /// Queue a transport failure
        pub fn then_outage(&self) -> &Self {
            self.push(Err(ApiError::Status(503)))
        }

        fn push(&self, answer: Result<WarningNowResponse, ApiError>) -> &Self {
            self.warnings.lock().unwrap().push_back(answer);
            self
        }
    }

    /// Cache store whose every read and write fails
    pub struct BrokenCache;

    impl CacheStore for BrokenCache {
        fn get_value(&self, _key: &str) -> Result<Option<Value>, CacheError> {
            Err(CacheError::Io(io::Error::new(io::ErrorKind::Other, "disk unavailable")))
        }

        fn set_value(&self, _key: &str, _value: &Value, _ttl: Option<Duration>) -> Result<(), CacheError> {
            Err(CacheError::Io(io::Error::new(io::ErrorKind::Other, "disk full")))
        }
    }

    #[async_trait]
    impl WeatherApi for ScriptedApi {
        async fn lookup_city(&self, query: &str) -> Result<CityLookupResponse, ApiError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(CityLookupResponse {
                code: CODE_OK.to_string(),
                location: vec![CityCandidate {
                    id: "101".to_string(),
                    name: query.to_string(),
                    ..Default::default()
                }],
            })
        }

        async fn warnings_now(&self, _location_id: &str) -> Result<WarningNowResponse, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.warnings
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ApiError::Status(503)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::snapshot;
    use super::*;

    #[test]
    fn test_snapshot_state_distinguishes_three_cases() {
        let empty = snapshot(&[]);
        let active = snapshot(&["Typhoon Warning"]);

        assert_eq!(SnapshotState::of(None), SnapshotState::Absent);
        assert_eq!(SnapshotState::of(Some(&empty)), SnapshotState::Empty);
        assert_eq!(SnapshotState::of(Some(&active)), SnapshotState::Active);
    }

    #[test]
    fn test_location_id_serializes_as_plain_string() {
        let id = LocationId::new("101280101");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"101280101\"");
    }

    #[test]
    fn test_location_query_keeps_literal_text() {
        let query = LocationQuery::new(" 广州 ");
        assert_eq!(query.as_str(), " 广州 ");
        assert_eq!(query.to_string(), " 广州 ");
    }
}
