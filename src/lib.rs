//! # ethresearch_scraper
//!
//! Finds the newest discussion thread on a Discourse forum's `/latest`
//! listing (ethresear.ch by default), checks that its first post follows the
//! forum's crawler template, and returns title, link, topic ID, author and
//! timestamp as an immutable [`PostDetails`].
//!
//! ## Architecture
//!
//! 1. **Transport** ([`fetch`]): one pooled HTTP client, bounded retries with
//!    capped exponential backoff
//! 2. **Extraction** ([`scrapers::discourse`]): listing rows → candidate
//!    links → topic pages → first-post details → newest by timestamp
//!
//! ## Usage
//!
//! ```no_run
//! use ethresearch_scraper::{DiscourseScraper, ScraperConfig};
//!
//! # async fn run() -> ethresearch_scraper::error::Result<()> {
//! let scraper = DiscourseScraper::new(ScraperConfig::default())?;
//! match scraper.get_latest_post().await? {
//!     Some(post) => println!("{} by {:?}", post.title(), post.authors()),
//!     None => println!("nothing new"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod outputs;
pub mod scrapers;
pub mod utils;

pub use config::ScraperConfig;
pub use error::{FetchError, ScraperError};
pub use models::PostDetails;
pub use scrapers::discourse::DiscourseScraper;
