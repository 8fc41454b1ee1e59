//! Data models for scraped forum posts.
//!
//! - [`PostDetails`]: the immutable result of one run, handed to the caller
//! - [`TopicDetails`]: what a topic page yields about its first post
//! - [`Candidate`]: a listing row joined with its topic details, still raw
//!
//! Only [`PostDetails`] leaves the crate's scraping layer; the other two live
//! for the duration of a single run.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::error::{Result, ScraperError};

/// The newest first post found on the listing page.
///
/// Fields are private and only readable through accessors, so a value can
/// only exist if construction validated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetails {
    title: String,
    link: String,
    topic_id: String,
    authors: Vec<String>,
    /// Written as RFC 3339 with a numeric offset (`+00:00`, never `Z`).
    #[serde(serialize_with = "serialize_rfc3339")]
    timestamp: DateTime<FixedOffset>,
}

fn serialize_rfc3339<S>(
    ts: &DateTime<FixedOffset>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.to_rfc3339())
}

impl PostDetails {
    /// Build a result record, checking the non-empty invariants.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        topic_id: impl Into<String>,
        authors: Vec<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<Self> {
        let title = title.into();
        let link = link.into();
        let topic_id = topic_id.into();
        if title.trim().is_empty() {
            return Err(ScraperError::EmptyField("title"));
        }
        if link.trim().is_empty() {
            return Err(ScraperError::EmptyField("link"));
        }
        if topic_id.is_empty() {
            return Err(ScraperError::EmptyField("topic_id"));
        }
        if authors.is_empty() {
            return Err(ScraperError::EmptyField("authors"));
        }
        Ok(Self {
            title,
            link,
            topic_id,
            authors,
            timestamp,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Absolute URL of the topic.
    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn topic_id(&self) -> &str {
        &self.topic_id
    }

    /// Display names of the post's authors; in practice exactly one.
    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }
}

/// First-post facts extracted from a topic page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDetails {
    /// Trimmed display name of the post's author.
    pub author: String,
    /// The `datetime` attribute exactly as found in the page.
    pub timestamp: String,
    /// The details were read from the `post_1` block.
    pub is_post_1: bool,
}

/// A listing row that survived filtering and came back with topic details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub topic_id: String,
    pub author: String,
    pub timestamp: String,
}

impl Candidate {
    pub fn from_topic(
        title: String,
        link: String,
        topic_id: String,
        details: TopicDetails,
    ) -> Self {
        Self {
            title,
            link,
            topic_id,
            author: details.author,
            timestamp: details.timestamp,
        }
    }

    /// Parse this candidate's raw timestamp.
    pub fn parsed_timestamp(&self) -> Result<DateTime<FixedOffset>> {
        parse_timestamp(&self.timestamp)
    }

    /// Convert into the final record using an already-parsed timestamp.
    pub fn into_post_details(self, timestamp: DateTime<FixedOffset>) -> Result<PostDetails> {
        PostDetails::new(
            self.title,
            self.link,
            self.topic_id,
            vec![self.author],
            timestamp,
        )
    }
}

/// Parse an ISO-8601 instant.
///
/// RFC 3339 input (trailing `Z` or a numeric offset) keeps its offset. A
/// date-time without any offset is read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Ok(ts),
        Err(rfc_err) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc().fixed_offset())
            .map_err(|_| ScraperError::InvalidTimestamp {
                value: raw.to_string(),
                source: rfc_err,
            }),
    }
}
