//! Error types for fetching and scraping.
//!
//! Two layers, mirroring the two halves of the crate:
//!
//! - [`FetchError`]: a single failed GET attempt. Never escapes the
//!   [`crate::fetch::RetryFetch`] decorator on its own.
//! - [`ScraperError`]: everything a caller of the library can see.
//!
//! "Nothing found" is not an error anywhere in this crate; it is modelled as
//! `Ok(None)`.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, ScraperError>;

/// One failed HTTP attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body-decoding failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a status outside 2xx/3xx.
    #[error("unexpected HTTP status {status}")]
    Status { status: StatusCode },
}

/// Errors surfaced to callers of the scraper.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// Every attempt on `url` failed.
    #[error("all {attempts} attempts failed for {url}")]
    Network {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    /// A topic link from which no identifier could be derived.
    #[error("could not extract topic ID from '{url}': {reason}")]
    InvalidTopicUrl { url: String, reason: String },

    /// A datetime attribute that is not an ISO-8601 instant.
    #[error("invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A required text field was empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Configuration values failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("config file error: {0}")]
    ConfigFile(#[from] serde_yaml::Error),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScraperError {
    /// Create an invalid topic URL error.
    pub fn invalid_topic_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTopicUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// `true` for failures caused by the network rather than by page content.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}
