//! # ethresearch_scraper
//!
//! One-shot binary: find the newest Post #1 on a Discourse forum and print
//! it as JSON. Meant to be run from a scheduler; whatever consumes the JSON
//! (deduplication against the last seen post, social posting) lives elsewhere.
//!
//! ## Usage
//!
//! ```sh
//! ethresearch_scraper --config config.yaml --output state/latest.json
//! ```
//!
//! Exits successfully both when a post is found and when none is (`null` is
//! printed); exits with an error when the listing is unreachable or a topic
//! link cannot be understood.

use std::error::Error;

use clap::Parser;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use ethresearch_scraper::cli::Cli;
use ethresearch_scraper::config::ScraperConfig;
use ethresearch_scraper::outputs::json;
use ethresearch_scraper::scrapers::discourse::DiscourseScraper;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ethresearch_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Config ----
    let config = match &args.config {
        Some(path) => ScraperConfig::from_yaml_file(path)?,
        None => ScraperConfig::default(),
    };
    let config = config.with_overrides(args.overrides())?;
    info!(
        base_url = %config.base_url,
        max_retries = config.max_retries,
        retry_delay_secs = config.retry_delay_secs,
        timeout_secs = config.timeout_secs,
        "Configuration ready"
    );

    // ---- Scrape ----
    let scraper = DiscourseScraper::new(config)?;
    let latest = match scraper.get_latest_post().await {
        Ok(latest) => latest,
        Err(e) => {
            error!(error = %e, "Error in get_latest_post");
            return Err(e.into());
        }
    };

    // ---- Output ----
    println!("{}", json::render_result(latest.as_ref())?);
    if let Some(path) = &args.output {
        json::write_result(latest.as_ref(), path).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        found = latest.is_some(),
        "Execution complete"
    );

    Ok(())
}
