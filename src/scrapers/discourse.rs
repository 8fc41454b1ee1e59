//! Discourse "latest" scraper.
//!
//! Finds the newest Post #1 on a Discourse forum (ethresear.ch by default)
//! using only the server-rendered crawler HTML, in two phases:
//!
//! 1. **Indexing**: fetch `{base_url}/latest`, keep the first
//!    `max_topics_to_check` non-sticky rows, drop meta posts by title
//! 2. **Fetching**: for each remaining row, fetch the topic page and read
//!    author and `datetime` from the `post_1` block
//!
//! The newest surviving candidate by timestamp wins; on a tie the row that
//! appears first in the listing wins.
//!
//! # Failure policy
//!
//! | Where | Outcome |
//! |-------|---------|
//! | listing fetch exhausts retries | `Err(ScraperError::Network)` |
//! | row link yields no topic ID | `Err(ScraperError::InvalidTopicUrl)` |
//! | topic fetch fails, post #1 / author / datetime missing | row skipped |
//! | topic timestamp unparsable | row skipped |
//! | nothing survives | `Ok(None)` |
//!
//! Topic pages are fetched one after another in listing order.

use futures::stream::{self, TryStreamExt};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{Result, ScraperError};
use crate::fetch::{FetchPage, HttpFetcher, RetryFetch};
use crate::models::{Candidate, PostDetails, TopicDetails};
use crate::utils::{contains_any_phrase, element_text, truncate_for_log};

/// Listing rows, minus pinned topics.
static TOPIC_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr.topic-list-item:not(.sticky)").expect("static selector"));
static TOPIC_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td.main-link a.title").expect("static selector"));
/// The crawler view's first post body.
static FIRST_POST: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#post_1.topic-body.crawler-post").expect("static selector"));
static AUTHOR_NAME: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"span[itemprop~="author"] span[itemprop~="name"]"#)
        .expect("static selector")
});
static POST_TIME: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time[datetime]").expect("static selector"));

/// One listing row that has a title anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub title: String,
    /// Raw `href`, possibly relative; `None` when the anchor has none.
    pub href: Option<String>,
}

/// The parsed `/latest` page.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Non-sticky rows on the page, before the cap.
    pub total_rows: usize,
    /// Rows within the cap that carry a title anchor, in document order.
    pub rows: Vec<ListingRow>,
}

/// Parse the listing page, considering at most `max_topics` non-sticky rows.
///
/// Rows without a title anchor still count towards the cap.
pub fn parse_listing(html: &str, max_topics: usize) -> ListingPage {
    let document = Html::parse_document(html);
    let all_rows: Vec<_> = document.select(&TOPIC_ROW).collect();

    let rows = all_rows
        .iter()
        .take(max_topics)
        .filter_map(|row| {
            let anchor = row.select(&TOPIC_TITLE).next()?;
            Some(ListingRow {
                title: element_text(&anchor),
                href: anchor.value().attr("href").map(str::to_string),
            })
        })
        .collect();

    ListingPage {
        total_rows: all_rows.len(),
        rows,
    }
}

/// Derive a topic identifier from a topic URL.
///
/// The identifier is the last non-empty path segment, so a trailing slash
/// makes no difference and query strings never leak in.
///
/// # Errors
///
/// [`ScraperError::InvalidTopicUrl`] if the URL is empty, malformed, or has
/// no path segment after the host.
pub fn extract_topic_id(url: &str) -> Result<String> {
    if url.trim().is_empty() {
        return Err(ScraperError::invalid_topic_url(url, "empty URL"));
    }
    let parsed =
        Url::parse(url.trim()).map_err(|e| ScraperError::invalid_topic_url(url, e.to_string()))?;
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| ScraperError::invalid_topic_url(url, "no path segment"))
}

/// Read author and timestamp from a topic page's first post.
///
/// Returns `None` (after logging) when the page does not follow the expected
/// template: no `post_1` block, no author, no time element, or an empty
/// `datetime`. None of these are errors.
pub fn parse_post_details(html: &str, url: &str) -> Option<TopicDetails> {
    let document = Html::parse_document(html);

    let Some(first_post) = document.select(&FIRST_POST).next() else {
        warn!(%url, "Could not find post #1");
        debug!(%url, preview = %truncate_for_log(html, 300), "Topic page without post #1");
        return None;
    };

    let author = first_post
        .select(&AUTHOR_NAME)
        .next()
        .map(|el| element_text(&el))
        .filter(|name| !name.is_empty());
    let time = first_post.select(&POST_TIME).next();

    let (Some(author), Some(time)) = (author, time) else {
        warn!(%url, "Missing required elements in post #1");
        return None;
    };

    let timestamp = time.value().attr("datetime").unwrap_or_default().trim();
    if timestamp.is_empty() {
        warn!(%url, "No datetime found in post #1");
        return None;
    }

    Some(TopicDetails {
        author,
        timestamp: timestamp.to_string(),
        is_post_1: true,
    })
}

/// Pick the candidate with the latest timestamp and build the final record.
///
/// Candidates whose timestamp does not parse are dropped. Ties keep the
/// earliest candidate.
pub fn select_newest(candidates: Vec<Candidate>) -> Result<Option<PostDetails>> {
    let newest = candidates
        .into_iter()
        .filter_map(|candidate| match candidate.parsed_timestamp() {
            Ok(ts) => Some((ts, candidate)),
            Err(e) => {
                warn!(link = %candidate.link, error = %e, "Discarding candidate with bad timestamp");
                None
            }
        })
        .reduce(|best, next| if next.0 > best.0 { next } else { best });

    match newest {
        Some((ts, candidate)) => candidate.into_post_details(ts).map(Some),
        None => Ok(None),
    }
}

/// Scraper for a Discourse forum's latest topics.
///
/// Owns its configuration and a retrying fetcher; nothing else is mutable,
/// so one instance can serve any number of sequential runs.
#[derive(Debug)]
pub struct DiscourseScraper<F = HttpFetcher> {
    config: ScraperConfig,
    base: Url,
    fetcher: RetryFetch<F>,
}

impl DiscourseScraper<HttpFetcher> {
    /// Create a scraper that talks HTTP with the configured headers and timeout.
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Self::with_fetcher(config, fetcher)
    }
}

impl<F> DiscourseScraper<F>
where
    F: FetchPage,
{
    /// Create a scraper on top of any single-attempt fetcher.
    pub fn with_fetcher(config: ScraperConfig, fetcher: F) -> Result<Self> {
        config.validate()?;
        let base = config.base()?;
        let fetcher = RetryFetch::from_config(fetcher, &config);
        Ok(Self {
            config,
            base,
            fetcher,
        })
    }

    /// Fetch and parse one topic page.
    ///
    /// Network failures are logged and reported as `None`, like template
    /// mismatches, so one broken topic never aborts a run.
    #[instrument(level = "info", skip(self))]
    pub async fn get_topic_details(&self, url: &str) -> Option<TopicDetails> {
        match self.fetcher.fetch(url).await {
            Ok(html) => parse_post_details(&html, url),
            Err(e) => {
                error!(%url, error = %e, "Error fetching topic details");
                None
            }
        }
    }

    /// Find the newest Post #1 among the latest topics.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(post))` for the newest valid first post
    /// - `Ok(None)` when no row yielded a usable first post
    /// - `Err` when the listing is unreachable or a topic link is unusable
    #[instrument(level = "info", skip_all, fields(base_url = %self.base))]
    pub async fn get_latest_post(&self) -> Result<Option<PostDetails>> {
        let latest_url = self.config.latest_url()?;
        let html = self.fetcher.fetch(latest_url.as_str()).await?;

        let listing = parse_listing(&html, self.config.max_topics_to_check);
        info!(
            rows = listing.total_rows,
            considered = listing.rows.len(),
            "Found topic rows"
        );

        let candidates: Vec<Candidate> = stream::iter(listing.rows.into_iter().map(Ok::<_, ScraperError>))
            .try_filter_map(|row| self.inspect_row(row))
            .try_collect()
            .await?;

        if candidates.is_empty() {
            warn!("No valid Post #1s found");
            return Ok(None);
        }
        debug!(count = candidates.len(), "Collected candidates");

        let newest = select_newest(candidates)?;
        match &newest {
            Some(post) => info!(
                title = %post.title(),
                topic_id = %post.topic_id(),
                timestamp = %post.timestamp().to_rfc3339(),
                "Selected latest post"
            ),
            None => warn!("No candidate had a parseable timestamp"),
        }
        Ok(newest)
    }

    /// Filter one listing row and, if it passes, fetch its topic.
    async fn inspect_row(&self, row: ListingRow) -> Result<Option<Candidate>> {
        if row.title.is_empty() {
            debug!(href = ?row.href, "Skipping row with empty title");
            return Ok(None);
        }
        if contains_any_phrase(&row.title, &self.config.skip_phrases) {
            info!(title = %row.title, "Skipping filtered post");
            return Ok(None);
        }

        let href = row.href.as_deref().unwrap_or_default();
        let link = self
            .base
            .join(href)
            .map_err(|e| ScraperError::invalid_topic_url(href, e.to_string()))?
            .to_string();
        let topic_id = extract_topic_id(&link)?;

        let details = match self.get_topic_details(&link).await {
            Some(details) if details.is_post_1 => details,
            _ => return Ok(None),
        };

        Ok(Some(Candidate::from_topic(row.title, link, topic_id, details)))
    }
}
