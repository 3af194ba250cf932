//! HTTP client for the QWeather geocoding and warning endpoints

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ApiError, CityLookupResponse, WarningNowResponse, WeatherApi};

/// Base URL for the geocoding API
pub const DEFAULT_GEO_BASE_URL: &str = "https://geoapi.qweather.com";

/// Base URL for the weather API (developer tier)
pub const DEFAULT_ALERT_BASE_URL: &str = "https://devapi.qweather.com";

/// Client for the QWeather REST API
#[derive(Debug, Clone)]
pub struct QWeatherClient {
    client: Client,
    key: String,
    geo_base_url: String,
    alert_base_url: String,
    lang: Option<String>,
}

impl QWeatherClient {
    /// Create a client with the given API key and request timeout
    pub fn new(key: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, key))
    }

    /// Create a client with a custom HTTP client
    pub fn with_client(client: Client, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
            geo_base_url: DEFAULT_GEO_BASE_URL.to_string(),
            alert_base_url: DEFAULT_ALERT_BASE_URL.to_string(),
            lang: None,
        }
    }

    /// Override the geocoding base URL
    pub fn with_geo_base_url(mut self, url: impl Into<String>) -> Self {
        self.geo_base_url = url.into();
        self
    }

    /// Override the warning base URL (e.g. the paid `api.qweather.com` host)
    pub fn with_alert_base_url(mut self, url: impl Into<String>) -> Self {
        self.alert_base_url = url.into();
        self
    }

    /// Request warnings in a specific language (`en`, `zh`, ...)
    pub fn with_lang(mut self, lang: Option<String>) -> Self {
        self.lang = lang;
        self
    }

    fn geo_url(&self) -> String {
        format!("{}/v2/city/lookup", self.geo_base_url.trim_end_matches('/'))
    }

    fn warning_url(&self) -> String {
        format!("{}/v7/warning/now", self.alert_base_url.trim_end_matches('/'))
    }

    /// Issue a GET with the API key appended and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut request = self
            .client
            .get(url)
            .query(params)
            .query(&[("key", self.key.as_str())]);
        if let Some(lang) = &self.lang {
            request = request.query(&[("lang", lang.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(url, status = status.as_u16(), "upstream responded");
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl WeatherApi for QWeatherClient {
    async fn lookup_city(&self, query: &str) -> Result<CityLookupResponse, ApiError> {
        self.get_json(&self.geo_url(), &[("location", query)]).await
    }

    async fn warnings_now(&self, location_id: &str) -> Result<WarningNowResponse, ApiError> {
        self.get_json(&self.warning_url(), &[("location", location_id)])
            .await
    }
}
