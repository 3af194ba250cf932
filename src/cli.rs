//! Command-line interface parsing for qwalert
//!
//! Every option can also be supplied through the environment (or a `.env`
//! file), which is how the API key is normally provided.

use std::path::PathBuf;

use clap::Parser;

use crate::api::{DEFAULT_ALERT_BASE_URL, DEFAULT_GEO_BASE_URL};

/// qwalert - weather hazard alerts for a location, as a feed
#[derive(Parser, Debug)]
#[command(name = "qwalert")]
#[command(about = "Weather hazard alerts from QWeather, with last-known fallback during outages")]
#[command(version)]
pub struct Cli {
    /// Locations to report on
    ///
    /// Examples:
    ///   qwalert 广州
    ///   qwalert Beijing Shanghai
    #[arg(required = true, value_name = "LOCATION")]
    pub locations: Vec<String>,

    /// QWeather API key
    #[arg(long, env = "HEFENG_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// How long cached snapshots are kept, in days
    #[arg(long, env = "QWALERT_RETENTION_DAYS", default_value_t = 30)]
    pub retention_days: u64,

    /// Upstream request timeout, in seconds
    #[arg(long, env = "QWALERT_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Language for alert texts (e.g. en, zh)
    #[arg(long, env = "QWALERT_LANG")]
    pub lang: Option<String>,

    /// Cache directory (defaults to the platform cache dir)
    #[arg(long, env = "QWALERT_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Keep the cache in memory only; nothing survives the process
    #[arg(long, conflicts_with = "cache_dir")]
    pub memory_cache: bool,

    /// Geocoding API base URL
    #[arg(long, env = "QWALERT_GEO_URL", default_value = DEFAULT_GEO_BASE_URL)]
    pub geo_url: String,

    /// Warning API base URL
    #[arg(long, env = "QWALERT_ALERT_URL", default_value = DEFAULT_ALERT_BASE_URL)]
    pub alert_url: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "QWALERT_LOG", default_value = "info")]
    pub log_level: String,
}
