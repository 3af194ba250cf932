//! Upstream alert lookup
//!
//! One call to the warning endpoint per `fetch`, no retries. An empty warning
//! list is a successful fetch.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;
use tracing::debug;

use super::{AlertRecord, LocationId, Snapshot};
use crate::api::{ApiError, WarningNowResponse, WarningRecord, WeatherApi, CODE_OK};

/// Errors that can occur when fetching alerts
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure, timeout, HTTP error status or undecodable body
    #[error("Alert request failed: {0}")]
    Api(#[from] ApiError),

    /// The API answered with an error status in the body
    #[error("Alert request failed with upstream code {code}")]
    Upstream { code: String },

    /// The payload decoded but its contents are unusable
    #[error("Malformed alert payload: {0}")]
    Malformed(String),
}

/// Fetches the current alert snapshot for a resolved location
#[derive(Clone)]
pub struct AlertFetcher {
    api: Arc<dyn WeatherApi>,
}

impl AlertFetcher {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self { api }
    }

    /// Fetch the alert snapshot for `id`
    ///
    /// # Returns
    /// * `Ok(Snapshot)` - possibly with an empty alert list
    /// * `Err(FetchError)` - if the request failed or the payload is unusable
    pub async fn fetch(&self, id: &LocationId) -> Result<Snapshot, FetchError> {
        let response = self.api.warnings_now(id.as_str()).await?;
        let snapshot = parse_response(response)?;
        debug!(%id, alerts = snapshot.alerts.len(), "fetched alert snapshot");
        Ok(snapshot)
    }
}

/// Convert a warning/now payload into a Snapshot
fn parse_response(response: WarningNowResponse) -> Result<Snapshot, FetchError> {
    if response.code != CODE_OK {
        return Err(FetchError::Upstream {
            code: response.code,
        });
    }

    let updated_at = response
        .update_time
        .as_deref()
        .map(parse_time)
        .transpose()?;

    let alerts = response
        .warning
        .into_iter()
        .map(parse_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Snapshot {
        alerts,
        link: response.fx_link.filter(|link| !link.is_empty()),
        updated_at,
        fetched_at: Utc::now(),
    })
}

fn parse_record(record: WarningRecord) -> Result<AlertRecord, FetchError> {
    Ok(AlertRecord {
        pub_time: parse_time(&record.pub_time)?,
        start_time: parse_optional_time(record.start_time.as_deref())?,
        end_time: parse_optional_time(record.end_time.as_deref())?,
        title: record.title,
        description: record.text,
        id: record.id,
        sender: record.sender,
        severity: record.severity.filter(|s| !s.is_empty()),
        type_name: record.type_name.filter(|s| !s.is_empty()),
    })
}

/// Parse an upstream timestamp such as "2023-04-03T14:15+08:00"
///
/// The API omits seconds; full RFC 3339 is accepted as well.
fn parse_time(time_str: &str) -> Result<DateTime<FixedOffset>, FetchError> {
    DateTime::parse_from_str(time_str, "%Y-%m-%dT%H:%M%:z")
        .or_else(|_| DateTime::parse_from_rfc3339(time_str))
        .map_err(|_| FetchError::Malformed(format!("invalid time format: {}", time_str)))
}

/// Empty strings are how the API spells "no value" for optional times
fn parse_optional_time(time_str: Option<&str>) -> Result<Option<DateTime<FixedOffset>>, FetchError> {
    match time_str {
        None | Some("") => Ok(None),
        Some(s) => parse_time(s).map(Some),
    }
}
