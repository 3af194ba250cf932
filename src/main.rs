//! qwalert - weather hazard alerts for a location, as a JSON feed
//!
//! Prints one feed per location on stdout, in argument order. A location that
//! cannot be resolved still gets a feed, carrying an `error` field. Logs go to
//! stderr.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use qwalert::alerts::{present_unresolved, LocationQuery};
use qwalert::cli::Cli;
use qwalert::config::Config;
use qwalert::service::AlertFeedService;

/// Sets up stderr logging; RUST_LOG wins over `--log-level`
fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    let service = AlertFeedService::from_config(&config)?;

    let queries: Vec<LocationQuery> = cli.locations.iter().map(LocationQuery::new).collect();
    let results = service.feeds(&queries).await;

    let mut feeds = Vec::with_capacity(results.len());
    let mut failed = false;
    for (query, result) in queries.iter().zip(results) {
        match result {
            Ok(feed) => feeds.push(feed),
            Err(e) => {
                eprintln!("error: {}: {}", query, e);
                feeds.push(present_unresolved(query, &e));
                failed = true;
            }
        }
    }

    let json = match feeds.as_slice() {
        [single] => serde_json::to_string_pretty(single)?,
        _ => serde_json::to_string_pretty(&feeds)?,
    };
    println!("{}", json);

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
