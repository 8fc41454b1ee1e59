//! HTTP fetching with exponential backoff retry logic.
//!
//! This is the transport half of the crate. It knows nothing about HTML;
//! it turns a URL into a response body or a [`ScraperError::Network`].
//!
//! # Architecture
//!
//! - [`FetchPage`]: core trait, one GET attempt per call
//! - [`HttpFetcher`]: `reqwest`-backed implementation with the bot's headers
//! - [`RetryFetch`]: decorator that adds bounded retries to any [`FetchPage`]
//!
//! # Retry Strategy
//!
//! - `max_retries` total attempts (3 by default)
//! - The wait after failed attempt `i` (0-based) is `retry_delay * 2^i`
//! - Each wait is capped at `max_retry_delay`
//! - No wait after the final attempt; its failure becomes the error's source

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::config::ScraperConfig;
use crate::error::{FetchError, Result, ScraperError};

pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";
pub const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";

/// A single GET attempt.
///
/// Implementors must not retry on their own; [`RetryFetch`] owns that policy.
pub trait FetchPage {
    /// Fetch `url` and return the response body as text.
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError>;
}

/// `reqwest`-backed page fetcher.
///
/// Holds one [`reqwest::Client`], so connections are pooled across the
/// listing page and every topic page of a run.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with the configured timeout and identifying headers.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        config.validate()?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client })
    }
}

impl FetchPage for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(FetchError::Status { status });
        }
        let body = response.text().await?;
        debug!(
            %status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "GET succeeded"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchPage`].
pub struct RetryFetch<T> {
    inner: T,
    /// Total attempts, including the first.
    max_retries: u32,
    /// Wait after the first failed attempt; doubles each time.
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: FetchPage,
{
    /// Create a retry wrapper from explicit limits.
    ///
    /// `max_retries` is clamped to at least one attempt.
    pub fn new(inner: T, max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            inner,
            max_retries: max_retries.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Create a retry wrapper using the limits in `config`.
    pub fn from_config(inner: T, config: &ScraperConfig) -> Self {
        Self::new(
            inner,
            config.max_retries,
            config.retry_delay(),
            config.max_retry_delay(),
        )
    }

    /// The wait that follows failed attempt `attempt_index` (0-based).
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt_index);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The wrapped single-attempt fetcher.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Fetch `url`, retrying until success or until attempts run out.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let total_t0 = Instant::now();
        let mut attempt_index = 0u32;

        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    let attempt = attempt_index + 1;
                    warn!(
                        attempt,
                        max = self.max_retries,
                        %url,
                        error = %e,
                        "Request failed"
                    );

                    if attempt >= self.max_retries {
                        return Err(ScraperError::Network {
                            url: url.to_string(),
                            attempts: attempt,
                            source: e,
                        });
                    }

                    let delay = self.backoff_delay(attempt_index);
                    info!(
                        ?delay,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Waiting before retrying"
                    );
                    sleep(delay).await;
                    attempt_index += 1;
                }
            }
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

/// In-memory fetcher for tests: canned bodies per URL, failures for the rest.
#[cfg(test)]
pub(crate) mod mock {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use reqwest::StatusCode;

    use super::FetchPage;
    use crate::error::FetchError;

    #[derive(Debug, Default)]
    pub struct ScriptedFetcher {
        /// Bodies served on every request to the URL.
        pages: HashMap<String, String>,
        /// One-shot status failures consumed before `pages` is consulted.
        failures: Mutex<HashMap<String, VecDeque<StatusCode>>>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        pub fn fail_first(self, url: &str, statuses: &[StatusCode]) -> Self {
            self.failures
                .lock()
                .unwrap()
                .insert(url.to_string(), statuses.iter().copied().collect());
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self, url: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|u| u.as_str() == url)
                .count()
        }
    }

    impl FetchPage for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());

            let scripted = self
                .failures
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(|queue| queue.pop_front());
            if let Some(status) = scripted {
                return Err(FetchError::Status { status });
            }

            self.pages.get(url).cloned().ok_or(FetchError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::ScriptedFetcher;
    use super::*;
    use reqwest::StatusCode;
    use wiremock::matchers::{header, headers, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URL: &str = "https://ethresear.ch/latest";

    fn fast_retry(inner: ScriptedFetcher, max_retries: u32) -> RetryFetch<ScriptedFetcher> {
        RetryFetch::new(
            inner,
            max_retries,
            Duration::from_millis(1),
            Duration::from_millis(10),
        )
    }

    #[test]
    fn test_backoff_schedule_doubles() {
        let retry = RetryFetch::new(
            ScriptedFetcher::new(),
            5,
            Duration::from_secs(5),
            Duration::from_secs(300),
        );
        assert_eq!(retry.backoff_delay(0), Duration::from_secs(5));
        assert_eq!(retry.backoff_delay(1), Duration::from_secs(10));
        assert_eq!(retry.backoff_delay(2), Duration::from_secs(20));
    }

    #[test]
    fn test_backoff_is_capped() {
        let retry = RetryFetch::new(
            ScriptedFetcher::new(),
            40,
            Duration::from_secs(5),
            Duration::from_secs(60),
        );
        assert_eq!(retry.backoff_delay(4), Duration::from_secs(60));
        assert_eq!(retry.backoff_delay(39), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_retries_clamped_to_one_attempt() {
        let retry = fast_retry(ScriptedFetcher::new(), 0);
        assert_eq!(retry.max_retries(), 1);
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let retry = fast_retry(ScriptedFetcher::new().page(URL, "<html></html>"), 3);
        let body = retry.fetch(URL).await.unwrap();
        assert_eq!(body, "<html></html>");
        assert_eq!(retry.inner.request_count(URL), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let inner = ScriptedFetcher::new()
            .page(URL, "ok")
            .fail_first(URL, &[StatusCode::BAD_GATEWAY, StatusCode::SERVICE_UNAVAILABLE]);
        let retry = fast_retry(inner, 3);
        assert_eq!(retry.fetch(URL).await.unwrap(), "ok");
        assert_eq!(retry.inner.request_count(URL), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_yield_network_error() {
        let inner = ScriptedFetcher::new().fail_first(
            URL,
            &[
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::GATEWAY_TIMEOUT,
            ],
        );
        let retry = fast_retry(inner, 3);
        let err = retry.fetch(URL).await.unwrap_err();
        match err {
            ScraperError::Network {
                url,
                attempts,
                source: FetchError::Status { status },
            } => {
                assert_eq!(url, URL);
                assert_eq!(attempts, 3);
                assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
            }
            other => panic!("expected network error, got {other:?}"),
        }
        assert_eq!(retry.inner.request_count(URL), 3);
    }

    #[tokio::test]
    async fn test_http_fetcher_sends_identifying_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(header("user-agent", crate::config::DEFAULT_USER_AGENT))
            .and(headers("accept", vec!["text/html", "application/xhtml+xml"]))
            .and(headers("accept-language", vec!["en-US", "en;q=0.9"]))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>listing</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&ScraperConfig::default()).unwrap();
        let body = fetcher
            .fetch(&format!("{}/latest", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>listing</html>");
    }

    #[test]
    fn test_http_fetcher_rejects_unrepresentable_timeout() {
        let config = ScraperConfig {
            timeout_secs: 1e20,
            ..ScraperConfig::default()
        };
        assert!(matches!(
            HttpFetcher::new(&config),
            Err(ScraperError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_http_fetcher_treats_error_status_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/t/missing/1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&ScraperConfig::default()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/t/missing/1", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::Status {
                status: StatusCode::NOT_FOUND
            }
        ));
    }

    #[tokio::test]
    async fn test_http_fetcher_timeout_is_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let config = ScraperConfig {
            timeout_secs: 0.05,
            ..ScraperConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }
}
