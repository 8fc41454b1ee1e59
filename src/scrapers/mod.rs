//! Forum scrapers.
//!
//! Each scraper turns one forum's server-rendered HTML into [`crate::models::PostDetails`]
//! in two phases:
//!
//! 1. **Indexing**: read the listing page and pick candidate topic links
//! 2. **Fetching**: download each candidate's topic page and parse its first post
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Discourse forums | [`discourse`] | HTML scraping | Crawler view of `/latest`; ethresear.ch by default |
//!
//! Scrapers use:
//! - Sequential topic fetching in listing order, to stay gentle on the forum
//! - Graceful error handling (failed topic fetches are logged and skipped)
//! - Timestamp-based selection of the newest candidate

pub mod discourse;
