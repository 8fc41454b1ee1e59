//! Command-line interface definitions.
//!
//! All flags are optional. Values given here override the YAML config file,
//! which in turn overrides the built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ConfigOverrides;

/// Find the newest Post #1 on a Discourse forum's latest listing.
///
/// # Examples
///
/// ```sh
/// # ethresear.ch with default settings, result on stdout
/// ethresearch_scraper
///
/// # Another forum, fewer retries, result also written to a file
/// ethresearch_scraper --base-url https://forum.example.org --max-retries 2 -o out/latest.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Forum root URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Total attempts per request
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Base retry delay in seconds (doubles after each failure)
    #[arg(long)]
    pub retry_delay: Option<f64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Number of listing rows to inspect
    #[arg(long)]
    pub max_topics: Option<usize>,

    /// Also write the JSON result to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Collect the config-related flags.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            max_retries: self.max_retries,
            retry_delay_secs: self.retry_delay,
            timeout_secs: self.timeout,
            max_topics_to_check: self.max_topics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["ethresearch_scraper"]);
        assert!(cli.base_url.is_none());
        assert!(cli.output.is_none());
        let overrides = cli.overrides();
        assert!(overrides.max_retries.is_none());
        assert!(overrides.timeout_secs.is_none());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "ethresearch_scraper",
            "--base-url",
            "https://forum.example.org",
            "--max-retries",
            "5",
            "--retry-delay",
            "2.5",
            "--timeout",
            "10",
            "--max-topics",
            "8",
            "-o",
            "/tmp/latest.json",
        ]);

        assert_eq!(cli.output, Some(PathBuf::from("/tmp/latest.json")));
        let overrides = cli.overrides();
        assert_eq!(
            overrides.base_url.as_deref(),
            Some("https://forum.example.org")
        );
        assert_eq!(overrides.max_retries, Some(5));
        assert_eq!(overrides.retry_delay_secs, Some(2.5));
        assert_eq!(overrides.timeout_secs, Some(10.0));
        assert_eq!(overrides.max_topics_to_check, Some(8));
    }

    #[test]
    fn test_cli_rejects_non_numeric_retries() {
        assert!(Cli::try_parse_from(["ethresearch_scraper", "--max-retries", "many"]).is_err());
    }
}
