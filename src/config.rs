//! Scraper configuration.
//!
//! A [`ScraperConfig`] is built once, validated, and then handed to
//! [`crate::fetch::HttpFetcher`] and [`crate::scrapers::discourse::DiscourseScraper`],
//! which keep it for their whole lifetime. All fields have defaults, so an
//! empty YAML file (or no file at all) yields a working ethresear.ch setup.
//!
//! # Example `config.yaml`
//!
//! ```yaml
//! base_url: https://ethresear.ch
//! max_retries: 3
//! retry_delay_secs: 5
//! timeout_secs: 30
//! skip_phrases:
//!   - read before posting
//!   - posting guidelines
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{Result, ScraperError};

pub const DEFAULT_BASE_URL: &str = "https://ethresear.ch";
pub const DEFAULT_LATEST_PATH: &str = "/latest";
pub const DEFAULT_USER_AGENT: &str = "ETHResearchSocialsBot/1.0 (Compatible; Research Project)";
pub const DEFAULT_MAX_TOPICS_TO_CHECK: usize = 20;

/// Titles containing any of these (case-insensitively) are meta posts.
pub const DEFAULT_SKIP_PHRASES: [&str; 4] = [
    "read this before posting",
    "read before posting",
    "posting guidelines",
    "posting rules",
];

/// Runtime settings for one scraper instance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScraperConfig {
    /// Site root every listing link is resolved against.
    pub base_url: String,
    /// Path of the listing page, relative to `base_url`.
    pub latest_path: String,
    /// Total GET attempts per URL.
    pub max_retries: u32,
    /// Base of the exponential backoff, in seconds.
    pub retry_delay_secs: f64,
    /// Upper bound on a single backoff wait, in seconds.
    pub max_retry_delay_secs: f64,
    /// Per-request timeout, in seconds.
    pub timeout_secs: f64,
    /// Number of non-sticky listing rows considered per run.
    pub max_topics_to_check: usize,
    pub user_agent: String,
    /// Lowercase phrases that mark a title as a meta/announcement post.
    pub skip_phrases: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            latest_path: DEFAULT_LATEST_PATH.to_string(),
            max_retries: 3,
            retry_delay_secs: 5.0,
            max_retry_delay_secs: 300.0,
            timeout_secs: 30.0,
            max_topics_to_check: DEFAULT_MAX_TOPICS_TO_CHECK,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            skip_phrases: DEFAULT_SKIP_PHRASES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Values given on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub max_retries: Option<u32>,
    pub retry_delay_secs: Option<f64>,
    pub timeout_secs: Option<f64>,
    pub max_topics_to_check: Option<usize>,
}

impl ScraperConfig {
    /// Load a configuration from a YAML file and validate it.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&raw)?;
        debug!(?config, "Loaded scraper configuration");
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a mapping.
        let config: Self = if raw.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(max_retries) = overrides.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(delay) = overrides.retry_delay_secs {
            self.retry_delay_secs = delay;
            // Keep the cap meaningful when only the base is raised.
            if self.max_retry_delay_secs < delay {
                self.max_retry_delay_secs = delay;
            }
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(max_topics) = overrides.max_topics_to_check {
            self.max_topics_to_check = max_topics;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ScraperError::config(format!("base_url '{}': {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScraperError::config(format!(
                "base_url '{}' must use http or https",
                self.base_url
            )));
        }
        if self.max_retries == 0 {
            return Err(ScraperError::config("max_retries must be at least 1"));
        }
        positive("retry_delay_secs", self.retry_delay_secs)?;
        positive("max_retry_delay_secs", self.max_retry_delay_secs)?;
        positive("timeout_secs", self.timeout_secs)?;
        if self.max_retry_delay_secs < self.retry_delay_secs {
            return Err(ScraperError::config(
                "max_retry_delay_secs must not be smaller than retry_delay_secs",
            ));
        }
        if self.max_topics_to_check == 0 {
            return Err(ScraperError::config("max_topics_to_check must be at least 1"));
        }
        if self.skip_phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(ScraperError::config("skip_phrases must not contain empty phrases"));
        }
        Ok(())
    }

    /// The parsed site root.
    pub fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| ScraperError::config(format!("base_url '{}': {e}", self.base_url)))
    }

    /// Absolute URL of the listing page.
    pub fn latest_url(&self) -> Result<Url> {
        self.base()?
            .join(&self.latest_path)
            .map_err(|e| ScraperError::config(format!("latest_path '{}': {e}", self.latest_path)))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay_secs)
    }

    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_retry_delay_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

/// A duration field must be positive and representable as a [`Duration`].
fn positive(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ScraperError::config(format!(
            "{name} must be a positive number of seconds, got {value}"
        )));
    }
    Duration::try_from_secs_f64(value)
        .map(|_| ())
        .map_err(|e| ScraperError::config(format!("{name} = {value}: {e}")))
}
