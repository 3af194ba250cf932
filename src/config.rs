//! Runtime configuration
//!
//! Built once from the parsed CLI and passed explicitly to the components that
//! need it.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::cli::Cli;

/// Configuration errors; fatal before any request is made
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API key given on the command line or in the environment
    #[error("Missing QWeather API key: set HEFENG_KEY or pass --key")]
    MissingApiKey,

    /// Retention must be at least one day
    #[error("Invalid retention: {0} days")]
    InvalidRetention(u64),

    /// Timeout must be at least one second
    #[error("Invalid timeout: {0} seconds")]
    InvalidTimeout(u64),
}

/// Where snapshots and resolved ids are cached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLocation {
    /// JSON files in the given directory, or the platform cache dir
    Disk(Option<PathBuf>),
    /// Process memory only
    Memory,
}

/// Validated settings for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    /// TTL shared by the `latest` and `last_active` snapshot slots
    pub retention: Duration,
    pub timeout: Duration,
    pub lang: Option<String>,
    pub cache: CacheLocation,
    pub geo_base_url: String,
    pub alert_base_url: String,
}

impl Config {
    /// Creates a Config from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Config)` with validated settings
    /// * `Err(ConfigError)` if the API key is missing or a duration is zero
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let api_key = cli
            .key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?
            .to_string();

        if cli.retention_days == 0 {
            return Err(ConfigError::InvalidRetention(cli.retention_days));
        }
        if cli.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(cli.timeout_secs));
        }

        let cache = if cli.memory_cache {
            CacheLocation::Memory
        } else {
            CacheLocation::Disk(cli.cache_dir.clone())
        };

        Ok(Config {
            api_key,
            retention: Duration::from_secs(cli.retention_days * 24 * 3600),
            timeout: Duration::from_secs(cli.timeout_secs),
            lang: cli.lang.clone(),
            cache,
            geo_base_url: cli.geo_url.clone(),
            alert_base_url: cli.alert_url.clone(),
        })
    }
}
