//! QWeather upstream API
//!
//! `WeatherApi` is the seam between the alert pipeline and the network: one
//! method per endpoint, returning the decoded wire payload. `QWeatherClient`
//! implements it over HTTP; tests substitute scripted fakes.

mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::{QWeatherClient, DEFAULT_ALERT_BASE_URL, DEFAULT_GEO_BASE_URL};

/// Status code QWeather puts in the body of a successful response
pub const CODE_OK: &str = "200";

/// Errors that can occur when talking to the upstream API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx HTTP status
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Endpoints of the upstream weather service used by the alert pipeline
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Geocoding lookup: free-text location to candidate list
    async fn lookup_city(&self, query: &str) -> Result<CityLookupResponse, ApiError>;

    /// Active hazard warnings for a resolved location id
    async fn warnings_now(&self, location_id: &str) -> Result<WarningNowResponse, ApiError>;
}

/// Response of `GET /v2/city/lookup`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CityLookupResponse {
    pub code: String,
    #[serde(default)]
    pub location: Vec<CityCandidate>,
}

/// One geocoding candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityCandidate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// First-level administrative division (province/state)
    #[serde(default)]
    pub adm1: Option<String>,
    /// Second-level administrative division (city)
    #[serde(default)]
    pub adm2: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Response of `GET /v7/warning/now`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningNowResponse {
    pub code: String,
    #[serde(default)]
    pub update_time: Option<String>,
    /// Link to the upstream detail page, shared by every warning
    #[serde(default)]
    pub fx_link: Option<String>,
    #[serde(default)]
    pub warning: Vec<WarningRecord>,
}

/// One warning as sent on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    pub pub_time: String,
    pub title: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub text: String,
}
